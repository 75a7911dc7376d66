use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log filter directive, overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a recording directory and list streamers, sessions and segments
    Scan {
        /// Root of the recording library
        dir: PathBuf,

        /// Output the result in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the comments of a danmu log in playback order
    Danmaku {
        file: PathBuf,

        /// Maximum number of comments to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show the overlay frame of a danmu log at a playback time
    Frame {
        file: PathBuf,

        /// Playback time in seconds
        #[arg(long)]
        at: f64,

        /// Settings file, defaults to the one in the data directory
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// List saved resume positions
    History {
        /// Forget every saved position
        #[arg(long)]
        clear: bool,
    },
}
