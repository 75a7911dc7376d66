//! Session playback: transport binding, segment switching and resume.

pub mod controller;
pub mod transport;

pub use controller::{HISTORY_SAVE_INTERVAL, PlaybackController, PlaybackStatus};
pub use transport::{PlaybackTransport, TransportError};
