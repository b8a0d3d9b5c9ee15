//! Source file discovery

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{ReelError, ReelResult};

/// Regular files in `directory`, sorted by path.
///
/// Only the top level is listed unless `recursive` is set. Links are
/// followed; entries that cannot be read (broken links, unreadable
/// directories, link loops) are logged and skipped.
pub fn discover_files(directory: &Path, recursive: bool) -> ReelResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(ReelError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Not a directory: {}", directory.display()),
        )));
    }

    let mut walker = WalkDir::new(directory)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
