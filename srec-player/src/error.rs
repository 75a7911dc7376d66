//! Application-wide error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
///
/// None of these are fatal to the player: callers skip the offending file,
/// record or segment and keep the rest of the library usable.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unrecognized recording filename {name:?}: {reason}")]
    FilenameParse { name: String, reason: String },

    #[error("Failed to read danmu log {}: {source}", .path.display())]
    CommentFileRead {
        path: PathBuf,
        #[source]
        source: danmaku::DanmakuError,
    },

    #[error("Playback failed for segment {segment}: {message}")]
    PlaybackTransport { segment: usize, message: String },

    #[error("Permission denied for {}, access to the library must be granted again", .path.display())]
    Permission { path: PathBuf },

    #[error("IO error while {op} {}: {source}", .path.display())]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn filename(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FilenameParse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn transport(segment: usize, message: impl Into<String>) -> Self {
        Self::PlaybackTransport {
            segment,
            message: message.into(),
        }
    }

    /// IO error with operation + path context.
    ///
    /// Permission failures map to [`Error::Permission`] so hosts can ask the
    /// user to grant access again.
    pub fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::Permission {
                path: path.to_path_buf(),
            };
        }
        Self::IoPath {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the host should prompt for re-authorization.
    pub fn needs_reauthorization(&self) -> bool {
        matches!(self, Self::Permission { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_maps_to_permission() {
        let err = Error::io_path(
            "scanning",
            Path::new("/library"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.needs_reauthorization());
    }

    #[test]
    fn test_other_io_errors_keep_context() {
        let err = Error::io_path(
            "reading",
            Path::new("/library/a.xml"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(!err.needs_reauthorization());
        assert!(err.to_string().contains("/library/a.xml"));
    }
}
