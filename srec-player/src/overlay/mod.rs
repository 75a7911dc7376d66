//! Danmu overlay: timing model, projection and track placement.

pub mod clock;
pub mod scheduler;
pub mod tracks;

pub use clock::{ClockState, PlaybackClock, RESYNC_THRESHOLD};
pub use scheduler::{
    BASE_DURATION, DEFAULT_MAX_TRACKS, LOOKAHEAD, OverlayLayout, RenderContent, Renderable,
    STICKER_SIZE, display_duration, horizontal_position, intrinsic_factor, max_display_duration,
    progress, project, project_with_plan,
};
pub use tracks::{TrackPlan, TrackStrategy, round_robin_track};
