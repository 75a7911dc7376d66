//! Domain model of a recording library.

pub mod file;
pub mod session;

pub use file::{FileKind, RawFile, StreamFile};
pub use session::{StreamSegment, StreamSession, StreamerProfile, segment_id, session_id};
