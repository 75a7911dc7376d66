//! srec-player library crate.
//!
//! Rebuilds watchable sessions from a directory of live-stream recordings and
//! replays their danmu logs as a scrolling overlay.

pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod library;
pub mod logging;
pub mod overlay;
pub mod player;
pub mod utils;

pub use error::{Error, Result};
