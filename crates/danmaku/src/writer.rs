//! XML writer for danmu logs.
//!
//! Writes comments back in the recorder's record layout so that exported
//! logs stay readable by the parser and by the recording tool itself.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::message::DanmakuItem;

/// XML writer for danmu logs.
///
/// # Example
///
/// ```ignore
/// use danmaku::XmlDanmakuWriter;
/// use std::path::PathBuf;
///
/// let mut writer = XmlDanmakuWriter::new(&PathBuf::from("output.xml")).await?;
/// writer.write_item(&item).await?;
/// writer.finalize().await?;
/// ```
pub struct XmlDanmakuWriter {
    path: PathBuf,
    file: Option<File>,
    item_count: u64,
}

impl XmlDanmakuWriter {
    /// Create a new XML writer at the specified path.
    ///
    /// This will create the file and write the XML header.
    pub async fn new(path: &Path) -> Result<Self> {
        let file = File::create(path).await?;
        let mut writer = Self {
            path: path.to_path_buf(),
            file: Some(file),
            item_count: 0,
        };

        writer.write_header().await?;

        Ok(writer)
    }

    /// Get the output path of this writer.
    pub fn output_path(&self) -> &Path {
        &self.path
    }

    /// Get the number of comments written so far.
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    async fn write_header(&mut self) -> Result<()> {
        if let Some(file) = &mut self.file {
            file.write_all(b"<?xml version=\"1.0\" encoding=\"utf-8\"?>\n")
                .await?;
            file.write_all(b"<i>\n").await?;
        }
        Ok(())
    }

    /// Write a comment to the XML file.
    pub async fn write_item(&mut self, item: &DanmakuItem) -> Result<()> {
        if let Some(file) = &mut self.file {
            let xml = format_record(item)?;
            file.write_all(xml.as_bytes()).await?;
            self.item_count += 1;

            // Flush periodically
            if self.item_count % 100 == 0 {
                file.flush().await?;
            }
        }
        Ok(())
    }

    /// Finalize the XML file by writing the closing tag.
    ///
    /// This should be called when all comments have been written.
    pub async fn finalize(&mut self) -> Result<()> {
        if let Some(file) = &mut self.file {
            file.write_all(b"</i>\n").await?;
            file.flush().await?;
        }
        self.file = None;
        Ok(())
    }
}

/// Format a single `<d>` record.
pub fn format_record(item: &DanmakuItem) -> Result<String> {
    let mut xml = format!(
        "  <d p=\"{:.3},{},{},{},{},{},{},{}\"",
        item.time,
        item.mode,
        item.size,
        item.color,
        item.timestamp,
        item.pool,
        escape_xml(&item.uid),
        escape_xml(&item.row_id),
    );
    if let Some(name) = &item.sender_name {
        xml.push_str(&format!(" user=\"{}\"", escape_xml(name)));
    }
    if let Some(raw) = raw_extension(item)? {
        xml.push_str(&format!(" raw=\"{}\"", escape_xml(&raw)));
    }
    xml.push_str(&format!(">{}</d>\n", escape_xml(&item.content)));
    Ok(xml)
}

/// Rebuild the minimal raw capture carrying the extension data.
///
/// Returns `None` when the comment has no medal, emotes or sticker.
fn raw_extension(item: &DanmakuItem) -> Result<Option<String>> {
    if item.medal.is_none() && item.emotes.is_none() && item.sticker_url.is_none() {
        return Ok(None);
    }

    let mut head = vec![serde_json::Value::from(0); 16];
    head[13] = match &item.sticker_url {
        Some(url) => serde_json::json!({ "url": url }),
        None => serde_json::Value::from("{}"),
    };
    if let Some(emotes) = &item.emotes {
        let emots: serde_json::Map<String, serde_json::Value> = emotes
            .iter()
            .map(|(code, url)| (code.clone(), serde_json::json!({ "url": url })))
            .collect();
        let extra = serde_json::to_string(&serde_json::json!({ "emots": emots }))?;
        head[15] = serde_json::json!({ "extra": extra });
    }

    let medal = match &item.medal {
        Some(medal) => serde_json::json!([
            medal.level,
            medal.name,
            "",
            0,
            0,
            "",
            0,
            medal.border_color
        ]),
        None => serde_json::json!([]),
    };
    let sender = serde_json::json!([
        item.uid.parse::<u64>().ok(),
        item.sender_name.as_deref().unwrap_or_default()
    ]);
    let info = serde_json::json!([head, item.content, sender, medal]);

    Ok(Some(serde_json::to_string(&info)?))
}

/// Escape special XML characters in a string.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
