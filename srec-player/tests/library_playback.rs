use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use danmaku::{DanmakuItem, XmlDanmakuWriter};
use srec_player::config::PlayerSettings;
use srec_player::history::HistoryStore;
use srec_player::library::{FileGrouper, scan_directory};
use srec_player::overlay::OverlayLayout;
use srec_player::player::{PlaybackController, PlaybackTransport, TransportError};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct RecordingTransport {
    loaded: Arc<Mutex<Vec<String>>>,
}

impl PlaybackTransport for RecordingTransport {
    fn load(&mut self, path: &Path) -> Result<(), TransportError> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.loaded.lock().unwrap().push(name);
        Ok(())
    }

    fn unload(&mut self) {}

    fn play(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _position: f64) {}

    fn set_rate(&mut self, _rate: f64) {}
}

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"video").unwrap();
}

async fn write_log(path: &Path, items: &[DanmakuItem]) {
    let mut writer = XmlDanmakuWriter::new(path).await.unwrap();
    for item in items {
        writer.write_item(item).await.unwrap();
    }
    writer.finalize().await.unwrap();
}

#[tokio::test]
async fn test_scan_group_and_play() {
    let temp = TempDir::new().unwrap();
    let room = temp.path().join("100-streamer");
    touch(&room.join("录制-100-20240101-200000-000-evening.flv"));
    touch(&room.join("录制-100-20240101-203000-000-evening.flv"));
    touch(&room.join("录制-100-20240101-220000-000-evening.flv"));
    touch(&temp.path().join("200-other").join("录制-200-20240102-100000-000-morning.mp4"));
    touch(&room.join("录制-100-20240101-200000-000-evening.cover.jpg"));
    write_log(
        &room.join("录制-100-20240101-200000-000-evening.xml"),
        &[
            DanmakuItem::new(12.0, "late"),
            DanmakuItem::new(3.0, "early").with_sender("42", "viewer"),
            DanmakuItem::new(3.5, "").with_sticker("https://example.com/sticker.png"),
        ],
    )
    .await;

    let files = scan_directory(temp.path()).unwrap();
    let profiles = FileGrouper::new().group(files);
    assert_eq!(profiles.len(), 2);

    let streamer = profiles.iter().find(|p| p.room_id == "100").unwrap();
    assert_eq!(streamer.name, "streamer");
    // 90 minute gap splits the evening into two sessions
    assert_eq!(streamer.sessions.len(), 2);
    let first = streamer
        .sessions
        .iter()
        .min_by_key(|s| s.start_time())
        .unwrap()
        .clone();
    assert_eq!(first.segments.len(), 2);
    assert!(first.segments[0].danmaku.is_some());
    assert!(first.cover().is_some());

    let history_path = temp.path().join("data").join("history.json");
    let transport = RecordingTransport::default();
    let mut player = PlaybackController::new(
        transport.clone(),
        first.clone(),
        HistoryStore::restore(&history_path).await,
        PlayerSettings::default(),
        OverlayLayout::default(),
    );
    player.open().await.unwrap();

    let comments: Vec<&str> = player.comments().iter().map(|c| c.content.as_str()).collect();
    assert_eq!(comments, vec!["early", "", "late"]);
    assert_eq!(player.comments()[0].sender_name.as_deref(), Some("viewer"));

    let now = Instant::now();
    player.on_play(now);
    player.on_time_update(4.0, now);
    let frame = player.frame(now + Duration::from_millis(100)).unwrap();
    assert_eq!(frame.len(), 2);
    assert!(frame.iter().all(|r| r.horizontal_position < 100.0));

    player.on_pause(now + Duration::from_secs(10));
    let saved = player.history().load(&first.id).unwrap();
    assert_eq!(saved.segment_index, 0);
    assert!(saved.time > 5.0);

    player.switch_segment(1).await.unwrap();
    let later = Instant::now();
    player.on_play(later);
    player.on_seek(30.0, later);
    player.shutdown().await;

    let history = HistoryStore::restore(&history_path).await;
    let mut resumed = PlaybackController::new(
        transport.clone(),
        first,
        history,
        PlayerSettings::default(),
        OverlayLayout::default(),
    );
    resumed.open().await.unwrap();
    assert_eq!(resumed.active_index(), Some(1));
    assert!(resumed.position(Instant::now()) >= 30.0);
    assert_eq!(
        transport.loaded.lock().unwrap().last().unwrap(),
        "录制-100-20240101-203000-000-evening.flv"
    );
}

#[tokio::test]
async fn test_rescan_keeps_session_ids() {
    let temp = TempDir::new().unwrap();
    touch(&temp.path().join("7-a").join("录制-7-20240301-080000-000-x.flv"));

    let first = FileGrouper::new().group(scan_directory(temp.path()).unwrap());
    touch(&temp.path().join("7-a").join("录制-7-20240301-083000-000-x.flv"));
    let second = FileGrouper::new().group(scan_directory(temp.path()).unwrap());

    assert_eq!(first[0].sessions[0].id, second[0].sessions[0].id);
    assert_eq!(second[0].sessions[0].segments.len(), 2);
}
