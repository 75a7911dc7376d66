//! Smoothed playback clock.
//!
//! The transport reports its position a few times per second. Between those
//! reports the overlay needs a per-frame time, so the clock extrapolates from
//! the last anchor at the current playback rate. Transport reports stay
//! authoritative: a report that drifts too far from the extrapolation
//! re-anchors the clock.

use std::time::Instant;

use tracing::trace;

/// Drift in seconds above which a position report re-anchors the clock.
pub const RESYNC_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockState {
    Stopped {
        position: f64,
    },
    Playing {
        anchor_position: f64,
        anchor_instant: Instant,
        rate: f64,
    },
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: ClockState,
    /// Last position reported by the transport
    authoritative: f64,
    rate: f64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PlaybackClock {
    pub fn new(rate: f64) -> Self {
        Self {
            state: ClockState::Stopped { position: 0.0 },
            authoritative: 0.0,
            rate,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, ClockState::Playing { .. })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Last position reported by the transport.
    pub fn authoritative(&self) -> f64 {
        self.authoritative
    }

    /// Best estimate of the playback position at `now`.
    pub fn position(&self, now: Instant) -> f64 {
        match self.state {
            ClockState::Stopped { position } => position,
            ClockState::Playing {
                anchor_position,
                anchor_instant,
                rate,
            } => {
                let elapsed = now.saturating_duration_since(anchor_instant).as_secs_f64();
                anchor_position + elapsed * rate
            }
        }
    }

    /// Record a transport position report.
    pub fn on_position(&mut self, position: f64, now: Instant) {
        if !position.is_finite() {
            return;
        }
        self.authoritative = position;
        match self.state {
            ClockState::Stopped { .. } => self.state = ClockState::Stopped { position },
            ClockState::Playing { .. } => {
                let drift = (self.position(now) - position).abs();
                if drift > RESYNC_THRESHOLD {
                    trace!(position, drift, "Re-anchoring playback clock");
                    self.anchor(position, now);
                }
            }
        }
    }

    pub fn play(&mut self, now: Instant) {
        if !self.is_playing() {
            let position = self.position(now);
            self.anchor(position, now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        let position = self.position(now);
        self.state = ClockState::Stopped { position };
    }

    pub fn seek(&mut self, position: f64, now: Instant) {
        if !position.is_finite() {
            return;
        }
        self.authoritative = position;
        match self.state {
            ClockState::Stopped { .. } => self.state = ClockState::Stopped { position },
            ClockState::Playing { .. } => self.anchor(position, now),
        }
    }

    pub fn set_rate(&mut self, rate: f64, now: Instant) {
        if !(rate.is_finite() && rate > 0.0) {
            return;
        }
        let position = self.position(now);
        self.rate = rate;
        if self.is_playing() {
            self.anchor(position, now);
        }
    }

    /// Smoothed time for a display tick, `None` while stopped.
    pub fn tick(&self, now: Instant) -> Option<f64> {
        self.is_playing().then(|| self.position(now))
    }

    /// Return to a stopped clock at zero.
    pub fn reset(&mut self) {
        self.state = ClockState::Stopped { position: 0.0 };
        self.authoritative = 0.0;
    }

    fn anchor(&mut self, position: f64, now: Instant) {
        self.state = ClockState::Playing {
            anchor_position: position,
            anchor_instant: now,
            rate: self.rate,
        };
    }
}
