//! Application configuration.
//!
//! Process-level paths and overlay layout come from the environment (with
//! `.env` support); user-facing playback settings live in [`settings`].

pub mod settings;

use std::path::PathBuf;

pub use settings::PlayerSettings;

use crate::overlay::{OverlayLayout, TrackStrategy};
use crate::{Error, Result};

const DATA_DIR_ENV: &str = "SREC_PLAYER_DATA_DIR";
const LOG_DIR_ENV: &str = "SREC_PLAYER_LOG_DIR";
const MAX_TRACKS_ENV: &str = "SREC_PLAYER_MAX_TRACKS";
const TRACK_STRATEGY_ENV: &str = "SREC_PLAYER_TRACK_STRATEGY";

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_LOG_DIR: &str = "./logs";

/// Process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding history and settings files
    pub data_dir: PathBuf,
    /// Directory for rolling log files
    pub log_dir: PathBuf,
    /// Overlay layout
    pub layout: OverlayLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            layout: OverlayLayout::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(MAX_TRACKS_ENV) {
            let max_tracks: usize = value.trim().parse().map_err(|_| {
                Error::config(format!("{MAX_TRACKS_ENV} must be a positive integer, got {value:?}"))
            })?;
            if max_tracks == 0 {
                return Err(Error::config(format!("{MAX_TRACKS_ENV} must be at least 1")));
            }
            config.layout.max_tracks = max_tracks;
        }
        if let Some(value) = lookup(TRACK_STRATEGY_ENV) {
            config.layout.track_strategy = match value.trim() {
                "round_robin" => TrackStrategy::RoundRobin,
                "interval" => TrackStrategy::Interval,
                other => {
                    return Err(Error::config(format!(
                        "{TRACK_STRATEGY_ENV} must be round_robin or interval, got {other:?}"
                    )));
                }
            };
        }

        Ok(config)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.history_path(), PathBuf::from("./data/history.json"));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (DATA_DIR_ENV, "/var/lib/player"),
            (MAX_TRACKS_ENV, "8"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/player"));
        assert_eq!(config.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(config.layout.max_tracks, 8);
        assert_eq!(config.layout.track_strategy, TrackStrategy::RoundRobin);
    }

    #[test]
    fn test_track_strategy() {
        let config = AppConfig::from_lookup(lookup(&[(TRACK_STRATEGY_ENV, "interval")])).unwrap();
        assert_eq!(config.layout.track_strategy, TrackStrategy::Interval);
        assert!(AppConfig::from_lookup(lookup(&[(TRACK_STRATEGY_ENV, "random")])).is_err());
    }

    #[test]
    fn test_invalid_track_count() {
        assert!(AppConfig::from_lookup(lookup(&[(MAX_TRACKS_ENV, "lots")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(MAX_TRACKS_ENV, "0")])).is_err());
    }
}
