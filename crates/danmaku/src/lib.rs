//! Danmaku: recorded live chat/comment log library.
//!
//! This crate reads and writes the danmu (弹幕) XML logs that live recorders
//! save next to each video file.
//!
//! ## Core Types
//!
//! - [`DanmakuItem`] - A single comment with its offset, style and sender info
//! - [`FanMedal`] - Fan medal worn by the sender
//! - [`RecordInfo`] - Recorder header of a log
//!
//! ## Input
//!
//! - [`parse`] / [`parse_document`] - Decode a log into time-sorted comments
//! - [`parse_file`] - Read and decode a log file
//!
//! ## Output
//!
//! - [`XmlDanmakuWriter`] - Write comments back in the recorder's layout

pub mod error;
pub mod message;
pub mod parser;
pub mod writer;

pub use error::{DanmakuError, Result};
pub use message::{DanmakuItem, FanMedal, RecordInfo, WHITE_COLOR, format_color};
pub use parser::{DanmakuDocument, parse, parse_document, parse_file};
pub use writer::{XmlDanmakuWriter, escape_xml, format_record};
