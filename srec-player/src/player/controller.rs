//! Session playback orchestration.
//!
//! The controller owns the per-segment resources (comment set, transport
//! binding, track plan) and rebuilds them on every segment switch. Teardown
//! runs before the next segment is built, on load failures and when the
//! controller is dropped.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use danmaku::DanmakuItem;
use tracing::{debug, info, warn};

use super::transport::{PlaybackTransport, TransportError};
use crate::config::PlayerSettings;
use crate::domain::{StreamSegment, StreamSession};
use crate::history::HistoryStore;
use crate::overlay::{
    OverlayLayout, PlaybackClock, Renderable, TrackPlan, TrackStrategy, project, project_with_plan,
};
use crate::{Error, Result};

/// Wall-clock interval between history saves while playing.
pub const HISTORY_SAVE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// No segment bound
    Idle,
    Paused,
    Playing,
    /// Last segment finished
    Ended,
}

/// Resources bound to the current segment.
#[derive(Debug)]
struct ActiveSegment {
    index: usize,
    items: Vec<DanmakuItem>,
    plan: Option<TrackPlan>,
}

pub struct PlaybackController<T: PlaybackTransport> {
    transport: T,
    session: StreamSession,
    history: HistoryStore,
    settings: PlayerSettings,
    layout: OverlayLayout,
    clock: PlaybackClock,
    active: Option<ActiveSegment>,
    /// Index of the segment selected last, bound or not
    selected: usize,
    status: PlaybackStatus,
    segment_errors: HashMap<usize, String>,
    long_press: bool,
    last_history_save: Option<Instant>,
}

impl<T: PlaybackTransport> PlaybackController<T> {
    pub fn new(
        transport: T,
        session: StreamSession,
        history: HistoryStore,
        settings: PlayerSettings,
        layout: OverlayLayout,
    ) -> Self {
        let settings = settings.normalized();
        Self {
            transport,
            session,
            history,
            clock: PlaybackClock::new(settings.playback_rate),
            settings,
            layout,
            active: None,
            selected: 0,
            status: PlaybackStatus::Idle,
            segment_errors: HashMap::new(),
            long_press: false,
            last_history_save: None,
        }
    }

    /// Bind the session, resuming from history when a usable record exists.
    pub async fn open(&mut self) -> Result<()> {
        if self.session.segments.is_empty() {
            return Err(Error::not_found("segment", &self.session.id));
        }

        let (index, time) = match self.history.resume_point(&self.session.id) {
            Some(point) => {
                let index = point.segment_index.min(self.session.segments.len() - 1);
                info!(
                    session_id = %self.session.id,
                    segment = index,
                    time = point.time,
                    "Resuming playback"
                );
                (index, point.time)
            }
            None => (0, 0.0),
        };

        self.switch_segment_at(index, time).await
    }

    /// Switch to the start of segment `index`.
    pub async fn switch_segment(&mut self, index: usize) -> Result<()> {
        self.switch_segment_at(index, 0.0).await
    }

    /// Switch to segment `index` at `time` seconds.
    pub async fn switch_segment_at(&mut self, index: usize, time: f64) -> Result<()> {
        if index >= self.session.segments.len() {
            return Err(Error::not_found("segment", index.to_string()));
        }

        self.teardown(Instant::now());
        self.selected = index;

        let segment = &self.session.segments[index];
        let items = load_comments(segment).await;
        let video_path = segment.video.path().to_path_buf();
        debug!(segment = index, comments = items.len(), "Loaded segment comments");
        self.session.segments[index].set_comment_count(items.len());

        // Nothing is bound yet, so a failed load leaves history untouched
        if let Err(e) = self.transport.load(&video_path) {
            self.transport.unload();
            return Err(self.fail_segment(index, e));
        }

        self.active = Some(ActiveSegment {
            index,
            items,
            plan: None,
        });

        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        if time > 0.0 {
            self.transport.seek(time);
        }
        let now = Instant::now();
        self.clock.seek(time, now);
        self.apply_rate(now);
        self.status = PlaybackStatus::Paused;
        self.segment_errors.remove(&index);
        Ok(())
    }

    pub fn play(&mut self) -> Result<()> {
        let Some(index) = self.active_index() else {
            return Err(Error::not_found("segment", self.selected.to_string()));
        };
        if let Err(e) = self.transport.play() {
            return Err(self.fail_segment(index, e));
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.active.is_some() {
            self.transport.pause();
        }
    }

    pub fn seek(&mut self, position: f64) {
        if self.active.is_some() && position.is_finite() {
            self.transport.seek(position.max(0.0));
        }
    }

    pub fn on_time_update(&mut self, position: f64, now: Instant) {
        if self.active.is_none() {
            return;
        }
        self.clock.on_position(position, now);
        if self.status == PlaybackStatus::Playing {
            let due = self
                .last_history_save
                .is_none_or(|last| now.saturating_duration_since(last) >= HISTORY_SAVE_INTERVAL);
            if due {
                self.save_history(now);
            }
        }
    }

    /// Cache the duration the transport reported for the current segment.
    pub fn on_duration(&mut self, seconds: f64) {
        if let Some(index) = self.active_index() {
            self.session.segments[index].set_duration(seconds);
        }
    }

    pub fn on_play(&mut self, now: Instant) {
        if self.active.is_none() {
            return;
        }
        self.clock.play(now);
        self.status = PlaybackStatus::Playing;
        self.last_history_save = Some(now);
    }

    pub fn on_pause(&mut self, now: Instant) {
        if self.active.is_none() {
            return;
        }
        self.clock.pause(now);
        self.status = PlaybackStatus::Paused;
        self.save_history(now);
    }

    pub fn on_seek(&mut self, position: f64, now: Instant) {
        if self.active.is_none() {
            return;
        }
        self.clock.seek(position, now);
        self.save_history(now);
    }

    /// Advance to the next segment, or stop after the last one.
    pub async fn on_ended(&mut self, now: Instant) -> Result<()> {
        let Some(index) = self.active_index() else {
            return Ok(());
        };
        let next = index + 1;
        if next < self.session.segments.len() {
            info!(session_id = %self.session.id, segment = next, "Advancing to next segment");
            self.switch_segment(next).await?;
            self.play()
        } else {
            info!(session_id = %self.session.id, "Session finished");
            self.clock.pause(now);
            self.status = PlaybackStatus::Ended;
            self.history.remove(&self.session.id);
            Ok(())
        }
    }

    /// Record a transport failure for the current segment.
    pub fn on_error(&mut self, error: TransportError) {
        let index = self.active_index().unwrap_or(self.selected);
        self.fail_segment(index, error);
    }

    /// Renderables for the display tick at `now`, `None` while stopped.
    pub fn frame(&mut self, now: Instant) -> Option<Vec<Renderable<'_>>> {
        let time = self.clock.tick(now)?;
        self.refresh_plan();
        let active = self.active.as_ref()?;
        let frame = match (self.layout.track_strategy, &active.plan) {
            (TrackStrategy::Interval, Some(plan)) => {
                project_with_plan(&active.items, time, &self.settings, plan)
            }
            _ => project(&active.items, time, &self.settings, &self.layout),
        };
        Some(frame)
    }

    pub fn begin_long_press(&mut self, now: Instant) {
        if self.long_press || self.status != PlaybackStatus::Playing {
            return;
        }
        self.long_press = true;
        self.apply_rate(now);
    }

    pub fn end_long_press(&mut self, now: Instant) {
        if !self.long_press {
            return;
        }
        self.long_press = false;
        self.apply_rate(now);
    }

    /// Replace the settings; rate and overlay changes apply immediately.
    pub fn update_settings(&mut self, settings: PlayerSettings, now: Instant) {
        self.settings = settings.normalized();
        if self.active.is_some() {
            self.apply_rate(now);
        }
    }

    pub fn set_layout(&mut self, layout: OverlayLayout) {
        self.layout = layout;
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_segment(&self) -> usize {
        self.selected
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.as_ref().map(|active| active.index)
    }

    pub fn comments(&self) -> &[DanmakuItem] {
        self.active
            .as_ref()
            .map(|active| active.items.as_slice())
            .unwrap_or_default()
    }

    pub fn segment_error(&self, index: usize) -> Option<&str> {
        self.segment_errors.get(&index).map(String::as_str)
    }

    pub fn position(&self, now: Instant) -> f64 {
        self.clock.position(now)
    }

    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Save history and release every per-segment resource.
    pub fn close(&mut self) {
        self.teardown(Instant::now());
    }

    /// Tear down, persist the history and hand the store back.
    ///
    /// A persist failure is logged and leaves the returned store dirty.
    pub async fn shutdown(mut self) -> HistoryStore {
        self.teardown(Instant::now());
        if let Err(e) = self.history.persist().await {
            warn!(session_id = %self.session.id, error = %e, "Failed to persist history");
        }
        std::mem::take(&mut self.history)
    }

    fn current_rate(&self) -> f64 {
        if self.long_press {
            self.settings.long_press_rate
        } else {
            self.settings.playback_rate
        }
    }

    fn apply_rate(&mut self, now: Instant) {
        let rate = self.current_rate();
        self.transport.set_rate(rate);
        self.clock.set_rate(rate, now);
    }

    fn refresh_plan(&mut self) {
        if self.layout.track_strategy != TrackStrategy::Interval {
            return;
        }
        let speed = self.settings.speed;
        let max_tracks = self.layout.max_tracks;
        if let Some(active) = self.active.as_mut() {
            let stale = active
                .plan
                .as_ref()
                .is_none_or(|plan| !plan.matches(active.items.len(), speed, max_tracks));
            if stale {
                active.plan = Some(TrackPlan::build(&active.items, speed, max_tracks));
            }
        }
    }

    fn save_history(&mut self, now: Instant) {
        let Some(index) = self.active_index() else {
            return;
        };
        if self.status == PlaybackStatus::Ended {
            return;
        }
        let time = self.clock.position(now);
        self.history.save(&self.session.id, time, index);
        self.last_history_save = Some(now);
    }

    fn fail_segment(&mut self, index: usize, error: TransportError) -> Error {
        let error = Error::transport(index, error.to_string());
        warn!(session_id = %self.session.id, error = %error, "Segment playback failed");
        self.segment_errors.insert(index, error.to_string());
        self.teardown(Instant::now());
        error
    }

    fn teardown(&mut self, now: Instant) {
        if self.active.is_none() {
            return;
        }
        self.save_history(now);
        self.transport.unload();
        self.active = None;
        self.clock.reset();
        self.long_press = false;
        self.last_history_save = None;
        self.status = PlaybackStatus::Idle;
    }
}

/// Releases the transport binding. The history save made here only reaches
/// the in-memory store; use [`PlaybackController::shutdown`] to persist it.
impl<T: PlaybackTransport> Drop for PlaybackController<T> {
    fn drop(&mut self) {
        self.teardown(Instant::now());
    }
}

/// Read a segment's comment log; any failure yields an empty set.
async fn load_comments(segment: &StreamSegment) -> Vec<DanmakuItem> {
    let Some(file) = &segment.danmaku else {
        return Vec::new();
    };
    match danmaku::parse_file(&file.path).await {
        Ok(document) => document.items,
        Err(source) => {
            let error = Error::CommentFileRead {
                path: file.path.clone(),
                source,
            };
            warn!(error = %error, "Playing without comments");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawFile;
    use crate::library::group_files;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct FakeTransport {
        calls: Arc<Mutex<Vec<String>>>,
        fail_load: Option<String>,
    }

    impl FakeTransport {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl PlaybackTransport for FakeTransport {
        fn load(&mut self, path: &Path) -> std::result::Result<(), TransportError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.record(format!("load {name}"));
            match &self.fail_load {
                Some(fail) if name.contains(fail.as_str()) => {
                    Err(TransportError::Decode("bad codec".to_string()))
                }
                _ => Ok(()),
            }
        }

        fn unload(&mut self) {
            self.record("unload".to_string());
        }

        fn play(&mut self) -> std::result::Result<(), TransportError> {
            self.record("play".to_string());
            Ok(())
        }

        fn pause(&mut self) {
            self.record("pause".to_string());
        }

        fn seek(&mut self, position: f64) {
            self.record(format!("seek {position}"));
        }

        fn set_rate(&mut self, rate: f64) {
            self.record(format!("rate {rate}"));
        }
    }

    const COMMENTS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<i>
<d p="2.000,1,25,16777215,1704067200000,0,1,0">b</d>
<d p="1.000,1,25,16777215,1704067200000,0,1,0">a</d>
</i>"#;

    /// Two segments of one session; only the first has a comment log.
    fn fixture(temp: &TempDir) -> StreamSession {
        let room = temp.path().join("100-streamer");
        std::fs::create_dir_all(&room).unwrap();
        let first = room.join("录制-100-20240101-200000-000-title.flv");
        let second = room.join("录制-100-20240101-203000-000-title.flv");
        let xml = room.join("录制-100-20240101-200000-000-title.xml");
        std::fs::write(&first, b"v").unwrap();
        std::fs::write(&second, b"v").unwrap();
        std::fs::write(&xml, COMMENTS).unwrap();

        let files = [first, second, xml].into_iter().map(raw).collect::<Vec<_>>();
        let mut profiles = group_files(files);
        assert_eq!(profiles.len(), 1);
        let mut sessions = profiles.remove(0).sessions;
        assert_eq!(sessions.len(), 1);
        sessions.remove(0)
    }

    fn raw(path: PathBuf) -> RawFile {
        RawFile::new(path, 1, None)
    }

    fn controller(
        transport: FakeTransport,
        session: StreamSession,
        history: HistoryStore,
    ) -> PlaybackController<FakeTransport> {
        PlaybackController::new(
            transport,
            session,
            history,
            PlayerSettings::default(),
            OverlayLayout::default(),
        )
    }

    #[tokio::test]
    async fn test_open_without_history_starts_at_zero() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::default();
        let mut player = controller(transport.clone(), fixture(&temp), HistoryStore::new());

        player.open().await.unwrap();

        assert_eq!(player.active_index(), Some(0));
        assert_eq!(player.status(), PlaybackStatus::Paused);
        assert_eq!(player.comments().len(), 2);
        assert_eq!(player.comments()[0].content, "a");
        assert_eq!(player.session().segments[0].comment_count(), Some(2));
        assert_eq!(
            transport.calls(),
            vec!["load 录制-100-20240101-200000-000-title.flv", "rate 1"]
        );
    }

    #[tokio::test]
    async fn test_open_resumes_from_history() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let mut history = HistoryStore::new();
        history.save(&session.id, 42.0, 7);

        let transport = FakeTransport::default();
        let mut player = controller(transport.clone(), session, history);
        player.open().await.unwrap();

        // index clamped to the last segment
        assert_eq!(player.active_index(), Some(1));
        assert_eq!(player.position(Instant::now()), 42.0);
        assert!(transport.calls().contains(&"seek 42".to_string()));
    }

    #[tokio::test]
    async fn test_short_history_is_not_resumed() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let mut history = HistoryStore::new();
        history.save(&session.id, 4.0, 1);

        let mut player = controller(FakeTransport::default(), session, history);
        player.open().await.unwrap();

        assert_eq!(player.active_index(), Some(0));
        assert_eq!(player.position(Instant::now()), 0.0);
    }

    #[tokio::test]
    async fn test_switch_tears_down_previous_segment() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::default();
        let mut player = controller(transport.clone(), fixture(&temp), HistoryStore::new());
        player.open().await.unwrap();

        player.switch_segment(1).await.unwrap();

        assert_eq!(player.active_index(), Some(1));
        assert!(player.comments().is_empty());
        let calls = transport.calls();
        let unload = calls.iter().position(|c| c == "unload").unwrap();
        let second_load = calls.iter().rposition(|c| c.starts_with("load")).unwrap();
        assert!(unload < second_load);

        assert!(player.switch_segment(5).await.is_err());
        assert_eq!(player.active_index(), Some(1));
    }

    #[tokio::test]
    async fn test_load_failure_is_isolated_to_segment() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport {
            fail_load: Some("203000".to_string()),
            ..Default::default()
        };
        let mut player = controller(transport.clone(), fixture(&temp), HistoryStore::new());
        player.open().await.unwrap();

        let err = player.switch_segment(1).await.unwrap_err();
        assert!(matches!(err, Error::PlaybackTransport { segment: 1, .. }));
        assert!(player.segment_error(1).unwrap().contains("bad codec"));
        assert_eq!(player.active_index(), None);
        assert_eq!(transport.calls().last().unwrap(), "unload");

        player.switch_segment(0).await.unwrap();
        assert_eq!(player.active_index(), Some(0));
        assert!(player.segment_error(1).is_some());
        assert!(player.segment_error(0).is_none());
    }

    #[tokio::test]
    async fn test_missing_comment_log_plays_without_comments() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let xml = session.segments[0].danmaku.as_ref().unwrap().path.clone();
        std::fs::remove_file(xml).unwrap();

        let mut player = controller(FakeTransport::default(), session, HistoryStore::new());
        player.open().await.unwrap();

        assert_eq!(player.active_index(), Some(0));
        assert!(player.comments().is_empty());
    }

    #[tokio::test]
    async fn test_frame_follows_clock() {
        let temp = TempDir::new().unwrap();
        let mut player = controller(FakeTransport::default(), fixture(&temp), HistoryStore::new());
        player.open().await.unwrap();

        let now = Instant::now();
        assert!(player.frame(now).is_none());

        player.on_play(now);
        player.on_time_update(1.5, now);
        let frame = player.frame(now).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame[0].index, 0);

        player.on_pause(now);
        assert!(player.frame(now).is_none());
    }

    #[tokio::test]
    async fn test_interval_layout_uses_track_plan() {
        let temp = TempDir::new().unwrap();
        let mut player = controller(FakeTransport::default(), fixture(&temp), HistoryStore::new());
        player.set_layout(OverlayLayout {
            max_tracks: 1,
            track_strategy: TrackStrategy::Interval,
        });
        player.open().await.unwrap();

        let now = Instant::now();
        player.on_play(now);
        player.on_time_update(2.0, now);
        let frame = player.frame(now).unwrap();
        assert!(frame.iter().all(|r| r.track == 0));
    }

    #[tokio::test]
    async fn test_history_saved_on_interval_pause_and_seek() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let id = session.id.clone();
        let mut player = controller(FakeTransport::default(), session, HistoryStore::new());
        player.open().await.unwrap();

        let start = Instant::now();
        player.on_play(start);
        player.on_time_update(2.0, start + Duration::from_secs(2));
        assert!(player.history().load(&id).is_none());

        player.on_time_update(6.0, start + Duration::from_secs(6));
        assert_eq!(player.history().load(&id).unwrap().time, 6.0);

        player.on_seek(120.0, start + Duration::from_secs(7));
        assert_eq!(player.history().load(&id).unwrap().time, 120.0);

        player.on_pause(start + Duration::from_secs(8));
        assert_eq!(player.status(), PlaybackStatus::Paused);
        assert_eq!(player.history().load(&id).unwrap().time, 121.0);
    }

    #[tokio::test]
    async fn test_ended_advances_then_finishes() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let id = session.id.clone();
        let transport = FakeTransport::default();
        let mut player = controller(transport.clone(), session, HistoryStore::new());
        player.open().await.unwrap();

        let now = Instant::now();
        player.on_play(now);
        player.on_ended(now).await.unwrap();
        assert_eq!(player.active_index(), Some(1));
        assert_eq!(transport.calls().last().unwrap(), "play");

        player.on_play(now);
        player.on_ended(now).await.unwrap();
        assert_eq!(player.status(), PlaybackStatus::Ended);
        assert!(player.history().load(&id).is_none());
    }

    #[tokio::test]
    async fn test_long_press_swaps_rate() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::default();
        let mut player = controller(transport.clone(), fixture(&temp), HistoryStore::new());
        player.open().await.unwrap();

        let now = Instant::now();
        player.begin_long_press(now);
        assert!(!transport.calls().contains(&"rate 2".to_string()));

        player.on_play(now);
        player.begin_long_press(now);
        assert_eq!(transport.calls().last().unwrap(), "rate 2");
        player.end_long_press(now);
        assert_eq!(transport.calls().last().unwrap(), "rate 1");
    }

    #[tokio::test]
    async fn test_on_duration_caches_segment_duration() {
        let temp = TempDir::new().unwrap();
        let mut player = controller(FakeTransport::default(), fixture(&temp), HistoryStore::new());
        player.open().await.unwrap();

        player.on_duration(1800.0);
        assert_eq!(player.session().segments[0].duration(), Some(1800.0));
    }

    #[tokio::test]
    async fn test_long_press_released_across_segment_end() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::default();
        let mut player = controller(transport.clone(), fixture(&temp), HistoryStore::new());
        player.open().await.unwrap();

        let now = Instant::now();
        player.on_play(now);
        player.begin_long_press(now);
        player.on_ended(now).await.unwrap();
        player.on_play(now);
        player.end_long_press(now);

        assert!(transport.calls().contains(&"rate 1".to_string()));
        let position = player.position(now + Duration::from_millis(400));
        assert!((position - 0.4).abs() < 1e-6, "clock ran at {position}");
    }

    #[tokio::test]
    async fn test_failed_resume_keeps_history() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let id = session.id.clone();
        let mut history = HistoryStore::new();
        history.save(&id, 300.0, 1);

        let transport = FakeTransport {
            fail_load: Some("203000".to_string()),
            ..Default::default()
        };
        let mut player = controller(transport, session, history);

        assert!(player.open().await.is_err());
        let record = player.history().load(&id).unwrap();
        assert_eq!(record.time, 300.0);
        assert_eq!(record.segment_index, 1);
    }

    #[tokio::test]
    async fn test_failed_switch_keeps_saved_position() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let id = session.id.clone();
        let transport = FakeTransport {
            fail_load: Some("203000".to_string()),
            ..Default::default()
        };
        let mut player = controller(transport, session, HistoryStore::new());
        player.open().await.unwrap();

        let now = Instant::now();
        player.on_play(now);
        player.on_seek(90.0, now);
        assert!(player.switch_segment(1).await.is_err());

        let record = player.history().load(&id).unwrap();
        assert_eq!(record.segment_index, 0);
        assert!(record.time >= 90.0);
    }

    #[tokio::test]
    async fn test_shutdown_persists_history() {
        let temp = TempDir::new().unwrap();
        let session = fixture(&temp);
        let id = session.id.clone();
        let path = temp.path().join("data").join("history.json");
        let history = HistoryStore::restore(&path).await;

        let transport = FakeTransport::default();
        let mut player = controller(transport.clone(), session, history);
        player.open().await.unwrap();
        let now = Instant::now();
        player.on_play(now);
        player.on_seek(75.0, now);

        let history = player.shutdown().await;
        assert!(!history.is_dirty());
        assert_eq!(transport.calls().last().unwrap(), "unload");

        let restored = HistoryStore::restore(&path).await;
        assert!(restored.load(&id).unwrap().time >= 75.0);
    }

    #[tokio::test]
    async fn test_drop_releases_transport() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::default();
        {
            let mut player = controller(transport.clone(), fixture(&temp), HistoryStore::new());
            player.open().await.unwrap();
            player.on_play(Instant::now());
        }
        assert_eq!(transport.calls().last().unwrap(), "unload");
    }
}
