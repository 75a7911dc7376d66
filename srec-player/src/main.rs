mod cli;
mod commands;

use clap::Parser;
use srec_player::config::AppConfig;
use srec_player::logging;

use crate::cli::{Args, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::from_env()?;

    let (log_config, _guard) = logging::init_logging(&config.log_dir)?;
    if let Some(filter) = &args.log_filter {
        log_config.set_filter(filter)?;
    }
    log_config.cleanup_expired().await;

    match args.command {
        Commands::Scan { dir, json } => commands::scan(&dir, json).await,
        Commands::Danmaku { file, limit } => commands::list_danmaku(&file, limit).await,
        Commands::Frame { file, at, settings } => {
            commands::frame(&config, &file, at, settings.as_deref()).await
        }
        Commands::History { clear } => commands::history(&config, clear).await,
    }
}
