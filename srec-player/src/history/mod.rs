//! Resume-position history.
//!
//! One record per session, capped at [`MAX_HISTORY_ENTRIES`] with
//! least-recently-saved eviction. The store is persisted as a JSON map keyed
//! by session id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;
use crate::utils::fs;

/// Maximum number of sessions tracked.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Saved positions at or below this many seconds are not resumed.
pub const RESUME_THRESHOLD_SECS: f64 = 5.0;

/// Last known position in a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackHistoryRecord {
    /// Position within the segment in seconds
    pub time: f64,
    pub segment_index: usize,
    pub saved_at: DateTime<Utc>,
}

impl PlaybackHistoryRecord {
    /// Whether playback should continue from this record.
    pub fn is_resumable(&self) -> bool {
        self.time > RESUME_THRESHOLD_SECS
    }
}

/// Where to continue playback of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumePoint {
    pub segment_index: usize,
    pub time: f64,
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    records: HashMap<String, PlaybackHistoryRecord>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl HistoryStore {
    /// In-memory store without a backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store backed by `path`.
    ///
    /// A missing file gives an empty store. An unreadable or corrupt file
    /// also gives an empty store and is overwritten on the next persist.
    pub async fn restore(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(json) => match serde_json::from_str::<HashMap<String, PlaybackHistoryRecord>>(&json) {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt history file, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No history file");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read history, starting empty");
                HashMap::new()
            }
        };

        let mut store = Self {
            records,
            path: Some(path),
            dirty: false,
        };
        if store.evict() > 0 {
            store.dirty = true;
        }
        store
    }

    /// Write the store to its backing file if it changed.
    pub async fn persist(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_vec_pretty(&self.records)?;
        fs::write_atomic(path, &json).await?;
        self.dirty = false;
        debug!(path = %path.display(), entries = self.records.len(), "Persisted history");
        Ok(())
    }

    /// Record the current position of a session.
    pub fn save(&mut self, session_id: &str, time: f64, segment_index: usize) {
        self.save_at(session_id, time, segment_index, Utc::now());
    }

    /// Record a position with an explicit save time.
    ///
    /// Save times are kept strictly increasing across the store so the
    /// eviction order is total even when the wall clock stalls or steps back.
    pub fn save_at(&mut self, session_id: &str, time: f64, segment_index: usize, now: DateTime<Utc>) {
        if !time.is_finite() {
            return;
        }
        let saved_at = match self.latest_saved_at() {
            Some(latest) if now <= latest => latest + Duration::milliseconds(1),
            _ => now,
        };
        self.records.insert(
            session_id.to_string(),
            PlaybackHistoryRecord {
                time: time.max(0.0),
                segment_index,
                saved_at,
            },
        );
        self.dirty = true;
        let evicted = self.evict();
        if evicted > 0 {
            debug!(evicted, "Evicted old history entries");
        }
    }

    pub fn load(&self, session_id: &str) -> Option<&PlaybackHistoryRecord> {
        self.records.get(session_id)
    }

    /// Resume point of a session, if its saved time is past the threshold.
    pub fn resume_point(&self, session_id: &str) -> Option<ResumePoint> {
        self.load(session_id)
            .filter(|record| record.is_resumable())
            .map(|record| ResumePoint {
                segment_index: record.segment_index,
                time: record.time,
            })
    }

    pub fn remove(&mut self, session_id: &str) -> Option<PlaybackHistoryRecord> {
        let removed = self.records.remove(session_id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Forget every session.
    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            info!(entries = self.records.len(), "Clearing playback history");
            self.records.clear();
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records ordered from most to least recently saved.
    pub fn entries(&self) -> Vec<(&str, &PlaybackHistoryRecord)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(id, record)| (id.as_str(), record))
            .collect();
        entries.sort_by(|a, b| b.1.saved_at.cmp(&a.1.saved_at).then_with(|| a.0.cmp(b.0)));
        entries
    }

    fn latest_saved_at(&self) -> Option<DateTime<Utc>> {
        self.records.values().map(|record| record.saved_at).max()
    }

    /// Drop least-recently-saved records above the cap.
    fn evict(&mut self) -> usize {
        let excess = self.records.len().saturating_sub(MAX_HISTORY_ENTRIES);
        if excess == 0 {
            return 0;
        }
        let mut oldest: Vec<(DateTime<Utc>, String)> = self
            .records
            .iter()
            .map(|(id, record)| (record.saved_at, id.clone()))
            .collect();
        oldest.sort();
        for (_, id) in oldest.into_iter().take(excess) {
            self.records.remove(&id);
        }
        excess
    }
}
