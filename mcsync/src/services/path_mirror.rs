//! Source tree walker
//!
//! Mirrors the source directory structure at the destination and submits one
//! job per audio file whose output does not exist yet. Traversal is
//! synchronous and depth-first: each directory's files are classified and
//! dispatched in name order, then its subdirectories are visited. Jobs run
//! on the worker pool independently of the walk.

use crate::models::{output_file_name, ConversionJob, FileExtensionClass};
use crate::services::conversion_scheduler::JobSender;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Tree walker feeding the worker pool
pub struct PathMirror {
    sender: JobSender,
}

impl PathMirror {
    pub fn new(sender: JobSender) -> Self {
        Self { sender }
    }

    /// Mirror `source_dir` into `dest_dir`, recursively
    ///
    /// A destination directory that cannot be created, or a source directory
    /// that cannot be listed, is logged and its subtree skipped; the rest of
    /// the walk continues.
    pub fn mirror(&self, source_dir: &Path, dest_dir: &Path) {
        if let Err(e) = fs::create_dir_all(dest_dir) {
            error!(
                destination = %dest_dir.display(),
                "Failed to create destination directory, skipping subtree: {}", e
            );
            return;
        }

        let mut entries = match fs::read_dir(source_dir) {
            Ok(entries) => entries
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(
                            directory = %source_dir.display(),
                            "Error reading directory entry: {}", e
                        );
                        None
                    }
                })
                .collect::<Vec<_>>(),
            Err(e) => {
                error!(directory = %source_dir.display(), "Failed to read directory: {}", e);
                return;
            }
        };
        entries.sort_by_key(|entry| entry.file_name());

        // Keyed case-insensitively: `Song.MP3` and `Song.mp3` are one file on
        // case-insensitive filesystems
        let mut claimed: HashSet<String> = HashSet::new();
        let mut subdirs: Vec<String> = Vec::new();

        for entry in &entries {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(path = %entry.path().display(), "Skipping entry with non-UTF-8 name");
                continue;
            };

            let class = FileExtensionClass::classify(name, || {
                entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
            });

            match class {
                FileExtensionClass::Directory => subdirs.push(name.to_string()),
                FileExtensionClass::Unrecognized => {
                    debug!(path = %entry.path().display(), "Ignoring entry");
                }
                FileExtensionClass::LosslessAudio(ext) | FileExtensionClass::LossyAudio(ext) => {
                    let output_name = output_file_name(name, ext);

                    if !claimed.insert(output_name.to_lowercase()) {
                        warn!(
                            source = %entry.path().display(),
                            output = %output_name,
                            "Output name already claimed in this directory, skipping"
                        );
                        self.sender.stats().record_skipped();
                        continue;
                    }

                    let destination = dest_dir.join(&output_name);
                    if destination.exists() {
                        info!("skipping {} because it already exists", name);
                        self.sender.stats().record_skipped();
                        continue;
                    }

                    let job = ConversionJob::new(entry.path(), destination, class);
                    if !self.sender.submit(job) {
                        return;
                    }
                }
            }
        }

        for name in subdirs {
            self.mirror(&source_dir.join(&name), &dest_dir.join(&name));
        }
    }
}

/// Whether `candidate` is `root` or lies beneath it
///
/// Both paths should be canonical.
pub fn is_within(candidate: &Path, root: &Path) -> bool {
    candidate.starts_with(root)
}

/// Canonical form of a path that may not exist yet
///
/// The deepest existing ancestor is canonicalized and the missing tail
/// appended. Falls back to the path as given when no ancestor resolves.
pub fn canonical_or_self(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }

        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}
