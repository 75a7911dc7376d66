//! Session reconstruction from a flat file collection.
//!
//! Files are grouped by room, ordered by recording time, and consecutive
//! recordings with the same title are merged into one session while the
//! break between them stays under the continuity threshold.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use chrono::Duration;
use tracing::{debug, info};

use crate::domain::{
    FileKind, RawFile, StreamFile, StreamSegment, StreamSession, StreamerProfile, segment_id,
};

/// Default maximum break between two files of the same session.
pub const CONTINUITY_THRESHOLD_MINUTES: i64 = 60;

/// Groups raw files into streamer → session → segment.
#[derive(Debug, Clone)]
pub struct FileGrouper {
    continuity_threshold: Duration,
    /// Reported durations by video path, carried over from earlier scans
    known_durations: HashMap<PathBuf, f64>,
    /// Comment counts by video path, carried over from earlier loads
    known_comment_counts: HashMap<PathBuf, usize>,
}

impl Default for FileGrouper {
    fn default() -> Self {
        Self::new()
    }
}

impl FileGrouper {
    pub fn new() -> Self {
        Self {
            continuity_threshold: Duration::minutes(CONTINUITY_THRESHOLD_MINUTES),
            known_durations: HashMap::new(),
            known_comment_counts: HashMap::new(),
        }
    }

    pub fn with_continuity_threshold(mut self, threshold: Duration) -> Self {
        self.continuity_threshold = threshold;
        self
    }

    /// Use durations already reported by the player instead of estimates.
    pub fn with_known_durations(mut self, durations: HashMap<PathBuf, f64>) -> Self {
        self.known_durations = durations;
        self
    }

    /// Use already known comment counts.
    pub fn with_known_comment_counts(mut self, counts: HashMap<PathBuf, usize>) -> Self {
        self.known_comment_counts = counts;
        self
    }

    /// Group an unordered file collection.
    ///
    /// Files that do not follow the naming template are skipped. Rooms
    /// without any video are omitted.
    pub fn group(&self, files: impl IntoIterator<Item = RawFile>) -> Vec<StreamerProfile> {
        let mut videos = Vec::new();
        let mut logs: HashMap<PathBuf, RawFile> = HashMap::new();
        let mut covers: HashMap<PathBuf, RawFile> = HashMap::new();
        let mut skipped = 0usize;

        for file in files {
            match file.kind() {
                Some(FileKind::Video) => match StreamFile::parse(file) {
                    Ok(video) => videos.push(video),
                    Err(e) => {
                        debug!(error = %e, "Skipping file");
                        skipped += 1;
                    }
                },
                Some(FileKind::DanmakuLog) => {
                    logs.insert(file.basename_key(), file);
                }
                Some(FileKind::Cover) => {
                    covers.entry(file.basename_key()).or_insert(file);
                }
                None => debug!(path = %file.path.display(), "Ignoring unsupported file"),
            }
        }

        let mut paired_keys = HashSet::new();
        let mut rooms: BTreeMap<String, Vec<StreamSegment>> = BTreeMap::new();
        for video in videos {
            let key = video.file.basename_key();
            let mut segment =
                StreamSegment::new(video, logs.get(&key).cloned(), covers.get(&key).cloned());
            if let Some(duration) = self.known_durations.get(segment.video.path()) {
                segment.set_duration(*duration);
            }
            if let Some(count) = self.known_comment_counts.get(segment.video.path()) {
                segment.set_comment_count(*count);
            }
            paired_keys.insert(key);
            rooms
                .entry(segment.video.room_id.clone())
                .or_default()
                .push(segment);
        }

        let orphans = logs
            .keys()
            .chain(covers.keys())
            .filter(|key| !paired_keys.contains(*key))
            .count();
        if orphans > 0 {
            debug!(count = orphans, "Dropping sidecar files without a video");
        }

        let mut profiles: Vec<StreamerProfile> = rooms
            .into_iter()
            .map(|(room_id, segments)| self.build_profile(room_id, segments))
            .collect();
        profiles.sort_by(|a, b| {
            b.latest_start()
                .cmp(&a.latest_start())
                .then_with(|| a.room_id.cmp(&b.room_id))
        });

        info!(
            streamers = profiles.len(),
            sessions = profiles.iter().map(|p| p.sessions.len()).sum::<usize>(),
            skipped,
            "Grouped recordings"
        );
        profiles
    }

    /// Re-apply grouping to already grouped output.
    ///
    /// Reported durations and comment counts travel with the files, so the
    /// result is identical to the input.
    pub fn regroup(&self, profiles: &[StreamerProfile]) -> Vec<StreamerProfile> {
        let mut durations = self.known_durations.clone();
        let mut comment_counts = self.known_comment_counts.clone();
        let mut files = Vec::new();
        for segment in profiles
            .iter()
            .flat_map(|p| &p.sessions)
            .flat_map(|s| &s.segments)
        {
            if let Some(duration) = segment.duration() {
                durations.insert(segment.video.path().to_path_buf(), duration);
            }
            if let Some(count) = segment.comment_count() {
                comment_counts.insert(segment.video.path().to_path_buf(), count);
            }
            files.push(segment.video.file.clone());
            files.extend(segment.danmaku.clone());
            files.extend(segment.cover.clone());
        }

        self.clone()
            .with_known_durations(durations)
            .with_known_comment_counts(comment_counts)
            .group(files)
    }

    fn build_profile(&self, room_id: String, mut segments: Vec<StreamSegment>) -> StreamerProfile {
        segments.sort_by(|a, b| {
            a.start_time()
                .cmp(&b.start_time())
                .then_with(|| a.video.path().cmp(b.video.path()))
        });

        let name = segments
            .iter()
            .rev()
            .find_map(|s| s.video.streamer_name.clone())
            .unwrap_or_else(|| room_id.clone());

        let mut sessions: Vec<StreamSession> = Vec::new();
        for segment in segments {
            match sessions.last_mut() {
                Some(session)
                    if session
                        .segments
                        .last()
                        .is_some_and(|prev| self.continues(prev, &segment)) =>
                {
                    session.segments.push(segment)
                }
                _ => sessions.push(StreamSession::new(&room_id, segment)),
            }
        }

        let mut seen = HashSet::new();
        for session in &mut sessions {
            // Two recordings of one room starting in the same second with different titles
            if !seen.insert(session.id.clone()) {
                let base = session.id.clone();
                let mut n = 1;
                while !seen.insert(format!("{base}-{n}")) {
                    n += 1;
                }
                session.id = format!("{base}-{n}");
            }
            for (index, segment) in session.segments.iter_mut().enumerate() {
                segment.id = segment_id(&room_id, segment.start_time(), index);
            }
        }

        StreamerProfile {
            room_id,
            name,
            sessions,
        }
    }

    /// Whether `next` continues the session that `prev` belongs to.
    fn continues(&self, prev: &StreamSegment, next: &StreamSegment) -> bool {
        if prev.title() != next.title() {
            return false;
        }
        let gap = next.start_time() - prev.end_time();
        gap < self.continuity_threshold
    }
}

/// Group files with the default settings.
pub fn group_files(files: impl IntoIterator<Item = RawFile>) -> Vec<StreamerProfile> {
    FileGrouper::new().group(files)
}
