//! Temp file management
//!
//! Every output is written to `<final path>.tmp` and renamed into place only
//! after the producing job succeeds. A failed or interrupted job leaves its
//! temp file behind; [`stale_purge`] removes those at the start of the next
//! run.

use crate::models::TEMP_EXTENSION;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Temp path for a would-be final output path
pub fn temp_path_for(final_path: &Path) -> PathBuf {
    let mut name: OsString = final_path.as_os_str().to_os_string();
    name.push(".");
    name.push(TEMP_EXTENSION);
    PathBuf::from(name)
}

/// Promote a finished temp file to its final path
///
/// Not retried on failure.
pub async fn finalize(temp_path: &Path, final_path: &Path) -> std::io::Result<()> {
    tokio::fs::rename(temp_path, final_path).await
}

/// Delete every temp-extension file under `root`
///
/// Returns the number of files removed. Unreadable entries and failed
/// deletions are logged and skipped.
pub fn stale_purge(root: &Path) -> usize {
    let mut removed = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error reading directory entry during temp purge: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_temp_extension(entry.path()) {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(path = %entry.path().display(), "Removed stale temp file");
                removed += 1;
            }
            Err(e) => {
                warn!(path = %entry.path().display(), "Failed to remove stale temp file: {}", e);
            }
        }
    }

    removed
}

fn has_temp_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(TEMP_EXTENSION))
        .unwrap_or(false)
}
