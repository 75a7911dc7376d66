//! Danmaku error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, DanmakuError>;

/// Errors that can occur while reading or writing danmu logs.
#[derive(Error, Debug)]
pub enum DanmakuError {
    /// IO errors (reading or writing a log file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A single `<d>` record could not be decoded
    #[error("Invalid record: {0}")]
    Record(String),

    /// Extension payload serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DanmakuError {
    /// Create a record error.
    pub fn record(msg: impl Into<String>) -> Self {
        Self::Record(msg.into())
    }

    /// Whether this error only affects a single record.
    pub fn is_record_error(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}
