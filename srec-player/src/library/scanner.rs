//! Directory walker producing the raw file collection.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::RawFile;
use crate::{Error, Result};

/// Recursively collect recording-related files under `root`.
///
/// Unreadable entries below the root are skipped with a warning. Failing to
/// read the root itself is an error, and a permission failure there is
/// reported as [`Error::Permission`].
pub fn scan_directory(root: &Path) -> Result<Vec<RawFile>> {
    let metadata = std::fs::metadata(root).map_err(|e| Error::io_path("scanning", root, e))?;
    if !metadata.is_dir() {
        return Err(Error::config(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() == 0 {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    return Err(Error::io_path("scanning", root, source));
                }
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let raw = match entry.metadata() {
            Ok(metadata) => RawFile::from_metadata(entry.path(), &metadata),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Skipping file without metadata");
                continue;
            }
        };
        if raw.kind().is_some() {
            files.push(raw);
        }
    }

    debug!(root = %root.display(), files = files.len(), "Scanned library");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_collects_known_kinds() {
        let temp = TempDir::new().unwrap();
        let room = temp.path().join("1-streamer");
        std::fs::create_dir_all(&room).unwrap();
        std::fs::write(room.join("录制-1-20240101-000000-000-t.flv"), b"video").unwrap();
        std::fs::write(room.join("录制-1-20240101-000000-000-t.xml"), b"<i></i>").unwrap();
        std::fs::write(room.join("notes.txt"), b"ignored").unwrap();

        let mut files = scan_directory(temp.path()).unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].size, 5);
        assert!(files[0].modified.is_some());
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        assert!(scan_directory(&temp.path().join("missing")).is_err());
    }
}
