//! Per-frame danmu projection.
//!
//! [`project`] is a pure function of the parsed comments, the playback time
//! and the settings. It never mutates the comments and is recomputed on every
//! display tick.

use std::collections::HashMap;

use danmaku::DanmakuItem;
use serde::{Deserialize, Serialize};

use super::tracks::{TrackPlan, TrackStrategy, round_robin_track};
use crate::config::PlayerSettings;

/// Seconds a shortest comment takes to cross the screen at 1.0x speed.
pub const BASE_DURATION: f64 = 16.0;

/// Comments are shown this many seconds before their offset to avoid pop-in.
pub const LOOKAHEAD: f64 = 0.5;

/// Intrinsic factor of the longest comments (slowest crossing bound).
pub const MIN_INTRINSIC_FACTOR: f64 = 0.75;

/// Content length from which the intrinsic factor stops changing.
const MAX_COUNTED_LEN: usize = 10;

/// Edge length of sticker images in pixels.
pub const STICKER_SIZE: f64 = 48.0;

/// Default number of vertical tracks.
pub const DEFAULT_MAX_TRACKS: usize = 12;

/// Overlay geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLayout {
    pub max_tracks: usize,
    pub track_strategy: TrackStrategy,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            max_tracks: DEFAULT_MAX_TRACKS,
            track_strategy: TrackStrategy::RoundRobin,
        }
    }
}

/// Length-based speed adjustment: 1.0 for one character, 0.75 from ten on.
pub fn intrinsic_factor(len: usize) -> f64 {
    let len = len.clamp(1, MAX_COUNTED_LEN) as f64;
    1.0 - (len - 1.0) / (MAX_COUNTED_LEN as f64 - 1.0) * (1.0 - MIN_INTRINSIC_FACTOR)
}

/// Seconds a comment of `len` characters stays on screen.
pub fn display_duration(len: usize, speed: f64) -> f64 {
    BASE_DURATION / (speed * intrinsic_factor(len))
}

/// Upper bound of [`display_duration`] for any comment at `speed`.
pub fn max_display_duration(speed: f64) -> f64 {
    BASE_DURATION / (speed * MIN_INTRINSIC_FACTOR)
}

/// Fraction of the crossing completed at `current_time`.
///
/// The visible window is closed at both ends, so a comment is still drawn
/// at its exit edge (progress 1.0) on the frame where `current_time` is
/// exactly `item_time + duration`.
pub fn progress(item_time: f64, current_time: f64, duration: f64) -> f64 {
    (current_time - item_time) / duration
}

/// Horizontal offset in percent of the viewport width: +100 at entry, -100 at exit.
pub fn horizontal_position(progress: f64) -> f64 {
    100.0 - 200.0 * progress.clamp(0.0, 1.0)
}

/// What to draw for a comment.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderContent<'a> {
    Text {
        text: &'a str,
        emotes: Option<&'a HashMap<String, String>>,
    },
    Sticker {
        url: &'a str,
        size: f64,
    },
}

/// A comment positioned for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable<'a> {
    /// Index of the comment in the sorted sequence
    pub index: usize,
    pub content: RenderContent<'a>,
    pub horizontal_position: f64,
    pub progress: f64,
    pub duration: f64,
    pub track: usize,
    pub color: String,
    pub opacity: f64,
    pub font_size: f64,
}

/// Project the visible comments with round-robin tracks.
pub fn project<'a>(
    items: &'a [DanmakuItem],
    current_time: f64,
    settings: &PlayerSettings,
    layout: &OverlayLayout,
) -> Vec<Renderable<'a>> {
    let max_tracks = layout.max_tracks;
    project_with(items, current_time, settings, |index| {
        round_robin_track(index, max_tracks)
    })
}

/// Project the visible comments with tracks from a precomputed plan.
pub fn project_with_plan<'a>(
    items: &'a [DanmakuItem],
    current_time: f64,
    settings: &PlayerSettings,
    plan: &TrackPlan,
) -> Vec<Renderable<'a>> {
    project_with(items, current_time, settings, |index| plan.track(index))
}

/// Shared projection. `items` must be sorted by offset.
fn project_with<'a>(
    items: &'a [DanmakuItem],
    current_time: f64,
    settings: &PlayerSettings,
    track_of: impl Fn(usize) -> usize,
) -> Vec<Renderable<'a>> {
    if !settings.show || items.is_empty() || !current_time.is_finite() {
        return Vec::new();
    }
    let speed = settings.speed;

    // Pass 1: superset under the slowest crossing bound
    let earliest = current_time - max_display_duration(speed);
    let latest = current_time + LOOKAHEAD;
    let start = items.partition_point(|item| item.time < earliest);
    let end = items.partition_point(|item| item.time <= latest);
    if start >= end {
        return Vec::new();
    }

    // Pass 2: exact window [current_time - D, current_time + LOOKAHEAD], both ends closed
    items[start..end]
        .iter()
        .enumerate()
        .filter_map(|(offset, item)| {
            let index = start + offset;
            let duration = display_duration(item.content_len(), speed);
            if item.time < current_time - duration {
                return None;
            }
            let progress = progress(item.time, current_time, duration).max(0.0);
            let content = match item.sticker_url.as_deref() {
                Some(url) => RenderContent::Sticker {
                    url,
                    size: STICKER_SIZE,
                },
                None => RenderContent::Text {
                    text: &item.content,
                    emotes: item.emotes.as_ref(),
                },
            };
            Some(Renderable {
                index,
                content,
                horizontal_position: horizontal_position(progress),
                progress,
                duration,
                track: track_of(index),
                color: item.color_hex(),
                opacity: settings.opacity,
                font_size: item.size as f64 * settings.size,
            })
        })
        .collect()
}
