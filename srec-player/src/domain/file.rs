//! Recorded file entities.
//!
//! Recordings follow the recorder's default naming template:
//!
//! ```text
//! {roomId}-{streamer}/录制-{roomId}-{yyyyMMdd}-{HHmmss}-{fff}-{title}.flv
//! ```
//!
//! with the danmu log (`.xml`) and cover (`.cover.jpg` or `.jpg`) saved next
//! to the video under the same basename.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static RECORDING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^录制-(\d+)-(\d{8})-(\d{6})-(\d{3})-(.*)$").expect("recording name pattern")
});

static ROOM_FOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(.+)$").expect("room folder pattern"));

/// Suffix recorders put between the basename and the image extension of covers.
const COVER_SUFFIX: &str = ".cover";

/// Kind of file found in a recording library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Video,
    DanmakuLog,
    Cover,
}

impl FileKind {
    /// Classify a file by its (case-insensitive) extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "flv" | "mp4" | "mkv" | "ts" | "m4v" => Some(Self::Video),
            "xml" => Some(Self::DanmakuLog),
            "jpg" | "jpeg" | "png" | "webp" => Some(Self::Cover),
            _ => None,
        }
    }
}

/// A file handle as delivered by the directory source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile {
    pub path: PathBuf,
    pub size: u64,
    /// Last modification time, in the recorder's local wall-clock time
    pub modified: Option<NaiveDateTime>,
}

impl RawFile {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: Option<NaiveDateTime>) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }

    /// Build a handle from filesystem metadata.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &std::fs::Metadata) -> Self {
        let modified = metadata
            .modified()
            .ok()
            .map(|time| DateTime::<Local>::from(time).naive_local());
        Self::new(path, metadata.len(), modified)
    }

    /// Lowercased extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn kind(&self) -> Option<FileKind> {
        self.extension().as_deref().and_then(FileKind::from_extension)
    }

    /// Path without extension (and without the cover suffix), shared by a
    /// video and its sidecar files.
    pub fn basename_key(&self) -> PathBuf {
        let stem = self.path.with_extension("");
        match stem.to_str().and_then(|s| s.strip_suffix(COVER_SUFFIX)) {
            Some(stripped) => PathBuf::from(stripped),
            None => stem,
        }
    }

    fn file_stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }
}

/// A video file with its identity parsed from the filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFile {
    pub file: RawFile,
    pub room_id: String,
    pub streamer_name: Option<String>,
    pub recorded_at: NaiveDateTime,
    pub title: String,
    pub extension: String,
}

impl StreamFile {
    /// Parse the recorder's naming convention out of a file handle.
    pub fn parse(file: RawFile) -> Result<Self> {
        let name = file.path.display().to_string();
        let stem = file
            .file_stem()
            .ok_or_else(|| Error::filename(&name, "no file name"))?;
        let caps = RECORDING_NAME
            .captures(stem)
            .ok_or_else(|| Error::filename(&name, "does not match the recorder template"))?;

        let date = NaiveDate::parse_from_str(&caps[2], "%Y%m%d")
            .map_err(|e| Error::filename(&name, format!("invalid date: {e}")))?;
        let time = NaiveTime::parse_from_str(&caps[3], "%H%M%S")
            .map_err(|e| Error::filename(&name, format!("invalid time: {e}")))?;
        let millis: i64 = caps[4]
            .parse()
            .map_err(|_| Error::filename(&name, "invalid milliseconds"))?;

        let room_id = caps[1].to_string();
        let streamer_name = streamer_from_folder(&file.path, &room_id);
        let extension = file.extension().unwrap_or_default();

        Ok(Self {
            room_id,
            streamer_name,
            recorded_at: NaiveDateTime::new(date, time) + Duration::milliseconds(millis),
            title: caps[5].to_string(),
            extension,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

/// Streamer name from a `{roomId}-{name}` parent folder of the same room.
fn streamer_from_folder(path: &Path, room_id: &str) -> Option<String> {
    let folder = path.parent()?.file_name()?.to_str()?;
    let caps = ROOM_FOLDER.captures(folder)?;
    (&caps[1] == room_id).then(|| caps[2].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(path: &str) -> RawFile {
        RawFile::new(path, 1024, None)
    }

    #[test]
    fn test_parse_recorder_name() {
        let file = StreamFile::parse(raw(
            "21452505-七海Nana7mi/录制-21452505-20230722-200102-345-今晚打游戏.flv",
        ))
        .unwrap();

        assert_eq!(file.room_id, "21452505");
        assert_eq!(file.streamer_name.as_deref(), Some("七海Nana7mi"));
        assert_eq!(file.title, "今晚打游戏");
        assert_eq!(file.extension, "flv");
        assert_eq!(
            file.recorded_at,
            NaiveDate::from_ymd_opt(2023, 7, 22)
                .unwrap()
                .and_hms_milli_opt(20, 1, 2, 345)
                .unwrap()
        );
    }

    #[test]
    fn test_title_may_contain_dashes_and_dots() {
        let file = StreamFile::parse(raw("录制-1-20230101-000000-000-a-b.c-d.mp4")).unwrap();
        assert_eq!(file.title, "a-b.c-d");
        assert!(file.streamer_name.is_none());
    }

    #[test]
    fn test_folder_of_other_room_is_ignored() {
        let file = StreamFile::parse(raw("999-someone/录制-1-20230101-000000-000-t.flv")).unwrap();
        assert!(file.streamer_name.is_none());
    }

    #[test]
    fn test_unparseable_names() {
        assert!(StreamFile::parse(raw("holiday.mp4")).is_err());
        assert!(StreamFile::parse(raw("录制-1-20231345-000000-000-t.flv")).is_err());
        assert!(StreamFile::parse(raw("录制-1-20230101-250000-000-t.flv")).is_err());
        assert!(matches!(
            StreamFile::parse(raw("录制-x-20230101-000000-000-t.flv")),
            Err(Error::FilenameParse { .. })
        ));
    }

    #[test]
    fn test_basename_key_pairs_sidecars() {
        let video = raw("room/录制-1-20230101-000000-000-t.flv");
        let log = raw("room/录制-1-20230101-000000-000-t.xml");
        let cover = raw("room/录制-1-20230101-000000-000-t.cover.jpg");
        let plain_cover = raw("room/录制-1-20230101-000000-000-t.png");

        assert_eq!(video.basename_key(), log.basename_key());
        assert_eq!(video.basename_key(), cover.basename_key());
        assert_eq!(video.basename_key(), plain_cover.basename_key());
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::from_extension("FLV"), Some(FileKind::Video));
        assert_eq!(FileKind::from_extension("xml"), Some(FileKind::DanmakuLog));
        assert_eq!(FileKind::from_extension("webp"), Some(FileKind::Cover));
        assert_eq!(FileKind::from_extension("txt"), None);
    }
}
