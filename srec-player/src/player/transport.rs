//! Video transport abstraction.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("failed to load media: {0}")]
    Load(String),

    #[error("failed to decode media: {0}")]
    Decode(String),

    #[error("unsupported media: {0}")]
    Unsupported(String),
}

/// Host video element driven by [`PlaybackController`](super::PlaybackController).
///
/// Commands are issued here; time, duration and state changes flow back
/// through the controller's `on_*` handlers.
pub trait PlaybackTransport {
    /// Bind a media file. Replaces any previous binding.
    fn load(&mut self, path: &Path) -> Result<(), TransportError>;

    /// Release the current binding. Must be safe to call when nothing is bound.
    fn unload(&mut self);

    fn play(&mut self) -> Result<(), TransportError>;

    fn pause(&mut self);

    fn seek(&mut self, position: f64);

    fn set_rate(&mut self, rate: f64);
}

impl<T: PlaybackTransport + ?Sized> PlaybackTransport for Box<T> {
    fn load(&mut self, path: &Path) -> Result<(), TransportError> {
        (**self).load(path)
    }

    fn unload(&mut self) {
        (**self).unload()
    }

    fn play(&mut self) -> Result<(), TransportError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn seek(&mut self, position: f64) {
        (**self).seek(position)
    }

    fn set_rate(&mut self, rate: f64) {
        (**self).set_rate(rate)
    }
}
