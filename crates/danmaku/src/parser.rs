//! XML reader for recorded danmu logs.
//!
//! Reads the record layout produced by live recorders:
//!
//! ```xml
//! <i>
//!   <BililiveRecorderRecordInfo roomid="123" name="streamer" title="title" start_time="..."/>
//!   <d p="12.345,1,25,16777215,1690000000000,0,abcdef,0" user="viewer" raw="[...]">text</d>
//! </i>
//! ```
//!
//! Parsing is lenient: a broken record is skipped and the rest of the file is
//! still read. Output is sorted by offset, keeping document order for ties.

use std::collections::HashMap;
use std::path::Path;

use chrono::DateTime;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DanmakuError, Result};
use crate::message::{DanmakuItem, FanMedal, RecordInfo};

/// Number of comma separated fields in the `p` attribute.
const P_FIELD_COUNT: usize = 8;

/// A parsed danmu log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DanmakuDocument {
    /// Recorder header, if the log carries one
    pub record_info: Option<RecordInfo>,
    /// Comments sorted by offset
    pub items: Vec<DanmakuItem>,
    /// Number of `<d>` records that were skipped
    pub skipped: usize,
}

/// Parse a danmu log into comments sorted by offset.
pub fn parse(bytes: &[u8]) -> Vec<DanmakuItem> {
    parse_document(bytes).items
}

/// Read and parse a danmu log file.
///
/// Only read failures are reported as errors; broken records are skipped.
pub async fn parse_file(path: &Path) -> Result<DanmakuDocument> {
    let bytes = tokio::fs::read(path).await?;
    let document = parse_document(&bytes);
    debug!(
        path = %path.display(),
        items = document.items.len(),
        skipped = document.skipped,
        "Parsed danmu log"
    );
    Ok(document)
}

/// Parse a danmu log, keeping the recorder header.
pub fn parse_document(bytes: &[u8]) -> DanmakuDocument {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut document = DanmakuDocument::default();
    let mut pending: Option<PendingRecord> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"d" => pending = Some(PendingRecord::from_element(&e)),
                b"BililiveRecorderRecordInfo" => document.record_info = Some(record_info(&e)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"d" => document.push(PendingRecord::from_element(&e).finish()),
                b"BililiveRecorderRecordInfo" => document.record_info = Some(record_info(&e)),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(record) = pending.as_mut() {
                    // Unknown entities keep their raw spelling instead of dropping the record.
                    match e.unescape() {
                        Ok(text) => record.content.push_str(&text),
                        Err(_) => record.content.push_str(&String::from_utf8_lossy(&e)),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(record) = pending.as_mut() {
                    record.content.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"d" {
                    if let Some(record) = pending.take() {
                        document.push(record.finish());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    parsed = document.items.len(),
                    "Danmu log is not well-formed, keeping records read so far"
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    // sort_by is stable, so equal offsets keep document order
    document.items.sort_by(|a, b| a.time.total_cmp(&b.time));
    document
}

impl DanmakuDocument {
    fn push(&mut self, item: Result<DanmakuItem>) {
        match item {
            Ok(item) => self.items.push(item),
            Err(e) => {
                debug!(error = %e, "Skipping danmu record");
                self.skipped += 1;
            }
        }
    }
}

/// Attributes and text collected for one `<d>` element.
#[derive(Debug, Default)]
struct PendingRecord {
    p: Option<String>,
    user: Option<String>,
    uid: Option<String>,
    raw: Option<String>,
    content: String,
    error: Option<String>,
}

impl PendingRecord {
    fn from_element(element: &BytesStart<'_>) -> Self {
        let mut record = Self::default();
        for attr in element.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(e) => {
                    record.error = Some(format!("bad attribute: {e}"));
                    continue;
                }
            };
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(e) => {
                    record.error = Some(format!("bad attribute value: {e}"));
                    continue;
                }
            };
            match attr.key.as_ref() {
                b"p" => record.p = Some(value),
                b"user" => record.user = Some(value),
                b"uid" => record.uid = Some(value),
                b"raw" => record.raw = Some(value),
                _ => {}
            }
        }
        record
    }

    fn finish(self) -> Result<DanmakuItem> {
        if let Some(error) = self.error {
            return Err(DanmakuError::record(error));
        }
        let p = self
            .p
            .ok_or_else(|| DanmakuError::record("missing p attribute"))?;
        let fields: Vec<&str> = p.split(',').map(str::trim).collect();
        if fields.len() < P_FIELD_COUNT {
            return Err(DanmakuError::record(format!(
                "expected {P_FIELD_COUNT} fields in p attribute, found {}",
                fields.len()
            )));
        }

        let time: f64 = parse_field(fields[0], "offset")?;
        if !time.is_finite() || time < 0.0 {
            return Err(DanmakuError::record(format!("invalid offset {time}")));
        }

        let mut item = DanmakuItem {
            time,
            mode: parse_field(fields[1], "type")?,
            size: parse_field(fields[2], "size")?,
            color: parse_field(fields[3], "color")?,
            timestamp: parse_field(fields[4], "timestamp")?,
            pool: parse_field(fields[5], "pool")?,
            uid: fields[6].to_string(),
            row_id: fields[7].to_string(),
            content: self.content,
            sender_name: self.user.filter(|name| !name.is_empty()),
            medal: None,
            emotes: None,
            sticker_url: None,
        };

        if let Some(raw) = self.raw.as_deref() {
            match serde_json::from_str::<Value>(raw) {
                Ok(info) => apply_raw_extension(&mut item, &info),
                Err(e) => debug!(error = %e, "Ignoring unreadable raw payload"),
            }
        }

        if let Some(uid) = self.uid.filter(|uid| !uid.is_empty()) {
            item.uid = uid;
        }

        Ok(item)
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| DanmakuError::record(format!("invalid {name} field {value:?}")))
}

/// Fill sender, medal, sticker and emote data from the recorder's raw capture
/// of the original message (`info` array).
fn apply_raw_extension(item: &mut DanmakuItem, info: &Value) {
    if item.sender_name.is_none() {
        item.sender_name = info
            .pointer("/2/1")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
    }

    if let Some(uid) = info.pointer("/2/0").and_then(Value::as_u64) {
        item.uid = uid.to_string();
    }

    item.medal = info.get(3).and_then(parse_medal);

    item.sticker_url = info
        .pointer("/0/13/url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    item.emotes = info
        .pointer("/0/15/extra")
        .and_then(Value::as_str)
        .and_then(|extra| serde_json::from_str::<Value>(extra).ok())
        .and_then(|extra| parse_emotes(&extra));
}

fn parse_medal(medal: &Value) -> Option<FanMedal> {
    let medal = medal.as_array()?;
    let name = medal.get(1)?.as_str().filter(|name| !name.is_empty())?;
    Some(FanMedal {
        name: name.to_string(),
        level: medal.first().and_then(as_u32).unwrap_or(0),
        border_color: medal.get(7).and_then(as_u32).unwrap_or(0),
    })
}

/// Out-of-range numbers are treated as missing.
fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}

fn parse_emotes(extra: &Value) -> Option<HashMap<String, String>> {
    let emots = extra.get("emots")?.as_object()?;
    let emotes: HashMap<String, String> = emots
        .iter()
        .filter_map(|(code, emote)| {
            let url = emote.get("url")?.as_str()?;
            Some((code.clone(), url.to_string()))
        })
        .collect();
    (!emotes.is_empty()).then_some(emotes)
}

fn record_info(element: &BytesStart<'_>) -> RecordInfo {
    let mut info = RecordInfo::default();
    for attr in element.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        let value = value.into_owned();
        match attr.key.as_ref() {
            b"roomid" => info.room_id = Some(value),
            b"name" => info.name = Some(value),
            b"title" => info.title = Some(value),
            b"start_time" => info.start_time = DateTime::parse_from_rfc3339(&value).ok(),
            _ => {}
        }
    }
    info
}
