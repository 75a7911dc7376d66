//! Danmu item types.
//!
//! Core structures for comments replayed from a recorded danmu log.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Packed color value recorders use for plain white comments.
pub const WHITE_COLOR: u32 = 16_777_215;

/// Default font size written by recorders.
pub const DEFAULT_FONT_SIZE: u32 = 25;

/// Fan medal worn by the sender of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanMedal {
    /// Medal name
    pub name: String,
    /// Medal level
    pub level: u32,
    /// Packed border color
    pub border_color: u32,
}

/// A single replayable danmu comment.
///
/// Field order mirrors the `p` attribute of the log record
/// (`offset,type,size,color,timestamp,pool,uid,rowId`), followed by the
/// optional extension data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DanmakuItem {
    /// Offset in seconds relative to the start of the recording
    pub time: f64,
    /// Display type (1 = scroll, 4 = bottom, 5 = top)
    pub mode: u8,
    /// Font size
    pub size: u32,
    /// Packed RGB color
    pub color: u32,
    /// Absolute send time (unix millis as written by the recorder)
    pub timestamp: i64,
    /// Pool flag
    pub pool: u8,
    /// Sender id
    pub uid: String,
    /// Record id
    pub row_id: String,
    /// Decoded text payload
    pub content: String,
    /// Display name of the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Fan medal of the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medal: Option<FanMedal>,
    /// Emote code -> image URL substitutions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotes: Option<HashMap<String, String>>,
    /// Sticker image shown instead of the text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker_url: Option<String>,
}

impl DanmakuItem {
    /// Create a plain scrolling comment.
    pub fn new(time: f64, content: impl Into<String>) -> Self {
        Self {
            time,
            mode: 1,
            size: DEFAULT_FONT_SIZE,
            color: WHITE_COLOR,
            timestamp: 0,
            pool: 0,
            uid: String::new(),
            row_id: String::new(),
            content: content.into(),
            sender_name: None,
            medal: None,
            emotes: None,
            sticker_url: None,
        }
    }

    /// Set the color of the comment.
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Set the sender of the comment.
    pub fn with_sender(mut self, uid: impl Into<String>, name: impl Into<String>) -> Self {
        self.uid = uid.into();
        self.sender_name = Some(name.into());
        self
    }

    /// Set the sticker image of the comment.
    pub fn with_sticker(mut self, url: impl Into<String>) -> Self {
        self.sticker_url = Some(url.into());
        self
    }

    /// Add an emote substitution.
    pub fn with_emote(mut self, code: impl Into<String>, url: impl Into<String>) -> Self {
        self.emotes
            .get_or_insert_with(HashMap::new)
            .insert(code.into(), url.into());
        self
    }

    /// Whether the comment renders as a sticker image.
    pub fn is_sticker(&self) -> bool {
        self.sticker_url.is_some()
    }

    /// Number of characters in the payload, at least 1.
    pub fn content_len(&self) -> usize {
        self.content.chars().count().max(1)
    }

    /// CSS hex color of the comment.
    pub fn color_hex(&self) -> String {
        format_color(self.color)
    }
}

/// Format a packed color as `#rrggbb`.
pub fn format_color(color: u32) -> String {
    if color == WHITE_COLOR {
        return "#ffffff".to_string();
    }
    format!("#{:06x}", color & 0x00ff_ffff)
}

/// Recorder header describing the room a log was captured from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordInfo {
    pub room_id: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_color() {
        assert_eq!(format_color(WHITE_COLOR), "#ffffff");
        assert_eq!(format_color(255), "#0000ff");
        assert_eq!(format_color(0), "#000000");
        assert_eq!(format_color(0xff0000), "#ff0000");
    }

    #[test]
    fn test_content_len() {
        assert_eq!(DanmakuItem::new(0.0, "").content_len(), 1);
        assert_eq!(DanmakuItem::new(0.0, "hello").content_len(), 5);
        assert_eq!(DanmakuItem::new(0.0, "你好世界").content_len(), 4);
    }

    #[test]
    fn test_builder() {
        let item = DanmakuItem::new(1.5, "[dog]")
            .with_sender("42", "viewer")
            .with_emote("[dog]", "https://example.com/dog.png");

        assert_eq!(item.uid, "42");
        assert_eq!(item.sender_name.as_deref(), Some("viewer"));
        assert!(!item.is_sticker());
        let emotes = item.emotes.as_ref().unwrap();
        assert_eq!(emotes.get("[dog]").unwrap(), "https://example.com/dog.png");
    }
}
