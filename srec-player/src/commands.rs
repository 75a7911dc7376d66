use std::path::Path;

use anyhow::Context;
#[cfg(feature = "colored-output")]
use colored::*;
use srec_player::config::{AppConfig, PlayerSettings};
use srec_player::domain::StreamerProfile;
use srec_player::history::HistoryStore;
use srec_player::library::{FileGrouper, scan_directory};
use srec_player::overlay::{RenderContent, TrackPlan, TrackStrategy, project, project_with_plan};
use tracing::info;

fn heading(text: &str) -> String {
    #[cfg(feature = "colored-output")]
    {
        text.green().bold().to_string()
    }
    #[cfg(not(feature = "colored-output"))]
    {
        text.to_string()
    }
}

pub async fn scan(dir: &Path, json: bool) -> anyhow::Result<()> {
    let root = dir.to_path_buf();
    let files = tokio::task::spawn_blocking(move || scan_directory(&root))
        .await
        .context("Scan task failed")?
        .with_context(|| format!("Failed to scan {}", dir.display()))?;

    let profiles = FileGrouper::new().group(files);
    let sessions: usize = profiles.iter().map(|p| p.sessions.len()).sum();
    info!(streamers = profiles.len(), sessions, "Library scanned");

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    for profile in &profiles {
        print_profile(profile);
    }
    Ok(())
}

fn print_profile(profile: &StreamerProfile) {
    println!(
        "\n{} {} ({} sessions)",
        heading(&profile.name),
        profile.room_id,
        profile.sessions.len()
    );
    for session in &profile.sessions {
        let start = session
            .start_time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!("  [{}] {} {}", session.id, start, session.title);
        for segment in &session.segments {
            let duration = segment
                .estimated_duration()
                .map(|d| format!("{:.0}s", d))
                .unwrap_or_else(|| "?".to_string());
            let danmu = if segment.danmaku.is_some() { "danmu" } else { "-" };
            println!(
                "    {} {:>8} {:>6} {}",
                segment.start_time().format("%H:%M:%S"),
                duration,
                danmu,
                segment.video.path().display()
            );
        }
    }
}

pub async fn list_danmaku(file: &Path, limit: usize) -> anyhow::Result<()> {
    let document = danmaku::parse_file(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if let Some(info) = &document.record_info {
        println!(
            "{} {} {}",
            heading("Room:"),
            info.room_id.as_deref().unwrap_or("?"),
            info.name.as_deref().unwrap_or_default()
        );
        if let Some(title) = &info.title {
            println!("{} {}", heading("Title:"), title);
        }
    }
    println!(
        "{} {} ({} skipped)",
        heading("Comments:"),
        document.items.len(),
        document.skipped
    );

    for item in document.items.iter().take(limit) {
        let sender = item.sender_name.as_deref().unwrap_or(&item.uid);
        let body = item.sticker_url.as_deref().unwrap_or(&item.content);
        println!("{:>10.3} {} {}: {}", item.time, item.color_hex(), sender, body);
    }
    Ok(())
}

pub async fn frame(
    config: &AppConfig,
    file: &Path,
    at: f64,
    settings: Option<&Path>,
) -> anyhow::Result<()> {
    let settings_path = settings
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.settings_path());
    let settings = PlayerSettings::load(&settings_path).await;
    let document = danmaku::parse_file(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let items = &document.items;

    let layout = config.layout;
    let frame = match layout.track_strategy {
        TrackStrategy::RoundRobin => project(items, at, &settings, &layout),
        TrackStrategy::Interval => {
            let plan = TrackPlan::build(items, settings.speed, layout.max_tracks);
            project_with_plan(items, at, &settings, &plan)
        }
    };

    println!("{} {} at {:.3}s", heading("Visible:"), frame.len(), at);
    for renderable in &frame {
        let content = match &renderable.content {
            RenderContent::Text { text, .. } => text.to_string(),
            RenderContent::Sticker { url, .. } => format!("[sticker {url}]"),
        };
        println!(
            "  track {:>2} {:>7.1}% {} {}",
            renderable.track, renderable.horizontal_position, renderable.color, content
        );
    }
    Ok(())
}

pub async fn history(config: &AppConfig, clear: bool) -> anyhow::Result<()> {
    let mut store = HistoryStore::restore(config.history_path()).await;

    if clear {
        store.clear();
        store.persist().await.context("Failed to save history")?;
        println!("History cleared");
        return Ok(());
    }

    println!("{} {}", heading("Sessions:"), store.len());
    for (session_id, record) in store.entries() {
        println!(
            "  {} segment {} at {:.1}s (saved {})",
            session_id,
            record.segment_index,
            record.time,
            record.saved_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
