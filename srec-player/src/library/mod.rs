//! Recording library: scanning and session reconstruction.

pub mod grouper;
pub mod scanner;

pub use grouper::{CONTINUITY_THRESHOLD_MINUTES, FileGrouper, group_files};
pub use scanner::scan_directory;
