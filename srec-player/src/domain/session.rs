//! Session entities.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::file::{RawFile, StreamFile};

/// Longest recording a modification time is trusted to describe.
const MAX_ESTIMATED_DURATION_SECS: i64 = 24 * 60 * 60;

/// Deterministic session id from room id + session start.
///
/// Stays the same across re-scans of an unchanged directory, so resume
/// history keeps pointing at the right session.
pub fn session_id(room_id: &str, start: NaiveDateTime) -> String {
    stable_id(&format!("{}:{}", room_id, start.and_utc().timestamp()))
}

/// Deterministic segment id from room id, segment start and position.
pub fn segment_id(room_id: &str, start: NaiveDateTime, index: usize) -> String {
    stable_id(&format!(
        "{}:{}:{}",
        room_id,
        start.and_utc().timestamp_millis(),
        index
    ))
}

fn stable_id(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..8])
}

/// One recorded file plus its sidecars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSegment {
    pub id: String,
    pub video: StreamFile,
    pub danmaku: Option<RawFile>,
    pub cover: Option<RawFile>,
    /// Reported duration in seconds
    duration: Option<f64>,
    /// Number of comments, known once the log has been parsed
    comment_count: Option<usize>,
}

impl StreamSegment {
    pub fn new(video: StreamFile, danmaku: Option<RawFile>, cover: Option<RawFile>) -> Self {
        Self {
            id: String::new(),
            video,
            danmaku,
            cover,
            duration: None,
            comment_count: None,
        }
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.video.recorded_at
    }

    pub fn title(&self) -> &str {
        &self.video.title
    }

    /// Reported duration in seconds.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Cache a duration reported by the player.
    pub fn set_duration(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds >= 0.0 {
            self.duration = Some(seconds);
        }
    }

    pub fn comment_count(&self) -> Option<usize> {
        self.comment_count
    }

    pub fn set_comment_count(&mut self, count: usize) {
        self.comment_count = Some(count);
    }

    /// Reported duration, or the span between start and last modification.
    pub fn estimated_duration(&self) -> Option<f64> {
        if let Some(duration) = self.duration {
            return Some(duration);
        }
        let modified = self.video.file.modified?;
        let span = (modified - self.start_time()).num_milliseconds();
        (span > 0 && span < MAX_ESTIMATED_DURATION_SECS * 1000).then(|| span as f64 / 1000.0)
    }

    /// End of the recording; falls back to the start when nothing is known.
    pub fn end_time(&self) -> NaiveDateTime {
        match self.estimated_duration() {
            Some(seconds) => self.start_time() + Duration::milliseconds((seconds * 1000.0) as i64),
            None => self.start_time(),
        }
    }
}

/// Ordered segments watched as one continuous stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSession {
    pub id: String,
    pub room_id: String,
    pub title: String,
    pub segments: Vec<StreamSegment>,
}

impl StreamSession {
    /// Start a session from its first segment.
    pub fn new(room_id: impl Into<String>, first: StreamSegment) -> Self {
        let room_id = room_id.into();
        Self {
            id: session_id(&room_id, first.start_time()),
            title: first.title().to_string(),
            room_id,
            segments: vec![first],
        }
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.segments.first().map(StreamSegment::start_time)
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.segments.iter().map(StreamSegment::end_time).max()
    }

    /// Sum of the known segment durations.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().filter_map(|s| s.duration()).sum()
    }

    /// Whether every segment has a reported duration.
    pub fn is_duration_complete(&self) -> bool {
        self.segments.iter().all(|s| s.duration().is_some())
    }

    /// Sum of the known comment counts.
    pub fn total_comment_count(&self) -> usize {
        self.segments.iter().filter_map(|s| s.comment_count()).sum()
    }

    /// First available cover of the session.
    pub fn cover(&self) -> Option<&RawFile> {
        self.segments.iter().find_map(|s| s.cover.as_ref())
    }

    pub fn segment_index(&self, segment_id: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.id == segment_id)
    }
}

/// A streamer (room) and the sessions recorded for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamerProfile {
    pub room_id: String,
    pub name: String,
    pub sessions: Vec<StreamSession>,
}

impl StreamerProfile {
    pub fn latest_start(&self) -> Option<NaiveDateTime> {
        self.sessions.iter().filter_map(StreamSession::start_time).max()
    }

    pub fn find_session(&self, session_id: &str) -> Option<&StreamSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }
}
