//! User playback settings.
//!
//! Settings are loaded field by field: a missing or invalid field falls back
//! to its own default without discarding the other fields, and numbers are
//! clamped to their allowed range.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::Result;
use crate::utils::fs;

pub const OPACITY_RANGE: (f64, f64) = (0.1, 1.0);
pub const SIZE_RANGE: (f64, f64) = (0.5, 2.0);
pub const SPEED_RANGE: (f64, f64) = (0.5, 2.0);
pub const PLAYBACK_RATE_RANGE: (f64, f64) = (0.25, 3.0);
pub const LONG_PRESS_RATES: [f64; 2] = [2.0, 3.0];

/// Overlay and playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    /// Whether the danmu overlay is shown
    pub show: bool,
    /// Overlay opacity
    pub opacity: f64,
    /// Font scale
    pub size: f64,
    /// Scroll speed multiplier
    pub speed: f64,
    /// Normal playback rate
    pub playback_rate: f64,
    /// Playback rate while long-pressing
    pub long_press_rate: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            show: true,
            opacity: 1.0,
            size: 1.0,
            speed: 1.0,
            playback_rate: 1.0,
            long_press_rate: LONG_PRESS_RATES[0],
        }
    }
}

impl PlayerSettings {
    /// Build settings from an arbitrary JSON value with per-field defaults.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(fields) = value.as_object() else {
            return defaults;
        };

        Self {
            show: fields
                .get("show")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.show),
            opacity: number(fields, "opacity")
                .map(|v| clamp(v, OPACITY_RANGE))
                .unwrap_or(defaults.opacity),
            size: number(fields, "size")
                .map(|v| clamp(v, SIZE_RANGE))
                .unwrap_or(defaults.size),
            speed: number(fields, "speed")
                .map(|v| clamp(v, SPEED_RANGE))
                .unwrap_or(defaults.speed),
            playback_rate: number(fields, "playbackRate")
                .map(|v| clamp(v, PLAYBACK_RATE_RANGE))
                .unwrap_or(defaults.playback_rate),
            long_press_rate: number(fields, "longPressRate")
                .map(snap_long_press_rate)
                .unwrap_or(defaults.long_press_rate),
        }
    }

    /// Clamp every field into its allowed range.
    pub fn normalized(self) -> Self {
        Self {
            show: self.show,
            opacity: clamp(self.opacity, OPACITY_RANGE),
            size: clamp(self.size, SIZE_RANGE),
            speed: clamp(self.speed, SPEED_RANGE),
            playback_rate: clamp(self.playback_rate, PLAYBACK_RATE_RANGE),
            long_press_rate: snap_long_press_rate(self.long_press_rate),
        }
    }

    /// Load settings from a JSON file.
    ///
    /// A missing or unreadable file yields the defaults.
    pub async fn load(path: &Path) -> Self {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read settings, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Value>(&json) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse settings, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.normalized())?;
        fs::write_atomic(path, json.as_bytes()).await
    }
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

/// Snap to the closest supported long-press rate.
fn snap_long_press_rate(value: f64) -> f64 {
    let [low, high] = LONG_PRESS_RATES;
    if value >= (low + high) / 2.0 { high } else { low }
}
