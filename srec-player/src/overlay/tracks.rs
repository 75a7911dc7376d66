//! Vertical track placement.

use danmaku::DanmakuItem;
use serde::{Deserialize, Serialize};

use super::scheduler::display_duration;

/// How comments are spread over the vertical tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStrategy {
    /// `arrival index mod track count`; constant time, may overlap.
    #[default]
    RoundRobin,
    /// Lowest track whose previous comment has already left the screen.
    Interval,
}

/// Round-robin track of the comment at `index` in the sorted sequence.
pub fn round_robin_track(index: usize, max_tracks: usize) -> usize {
    index % max_tracks.max(1)
}

/// Precomputed interval-based track assignment for one comment sequence.
///
/// Depends only on the comments, the scroll speed and the track count, so
/// it is rebuilt whenever one of those changes and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPlan {
    tracks: Vec<usize>,
    speed: f64,
    max_tracks: usize,
}

impl TrackPlan {
    /// Assign tracks to time-sorted comments.
    pub fn build(items: &[DanmakuItem], speed: f64, max_tracks: usize) -> Self {
        let max_tracks = max_tracks.max(1);
        let mut free_at = vec![f64::NEG_INFINITY; max_tracks];
        let mut tracks = Vec::with_capacity(items.len());

        for item in items {
            let track = free_at
                .iter()
                .position(|&free| free <= item.time)
                .unwrap_or_else(|| earliest_free(&free_at));
            free_at[track] = item.time + display_duration(item.content_len(), speed);
            tracks.push(track);
        }

        Self {
            tracks,
            speed,
            max_tracks,
        }
    }

    /// Track of the comment at `index`.
    pub fn track(&self, index: usize) -> usize {
        self.tracks
            .get(index)
            .copied()
            .unwrap_or_else(|| round_robin_track(index, self.max_tracks))
    }

    /// Whether the plan was built for these inputs.
    pub fn matches(&self, item_count: usize, speed: f64, max_tracks: usize) -> bool {
        self.tracks.len() == item_count && self.speed == speed && self.max_tracks == max_tracks.max(1)
    }
}

fn earliest_free(free_at: &[f64]) -> usize {
    free_at
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(track, _)| track)
        .unwrap_or(0)
}
