//! Per-file jobs and sync statistics

use crate::models::audio_file::FileExtensionClass;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One file to transcode or copy
///
/// Created by the tree walker, consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Absolute path of the source file
    pub source: PathBuf,
    /// Final output path at the destination
    pub destination: PathBuf,
    /// Lossless or lossy audio
    pub class: FileExtensionClass,
}

impl ConversionJob {
    pub fn new(source: PathBuf, destination: PathBuf, class: FileExtensionClass) -> Self {
        Self {
            source,
            destination,
            class,
        }
    }

    /// Source file name for log lines
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// What a finished job did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Converted,
    Copied,
    Failed,
}

/// Counters shared between the walker and the workers
#[derive(Debug, Default)]
pub struct SyncStats {
    purged: AtomicUsize,
    submitted: AtomicUsize,
    converted: AtomicUsize,
    copied: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_purged(&self, count: usize) {
        self.purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: JobOutcome) {
        let counter = match outcome {
            JobOutcome::Converted => &self.converted,
            JobOutcome::Copied => &self.copied,
            JobOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncReport {
        SyncReport {
            purged: self.purged.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            converted: self.converted.load(Ordering::Relaxed),
            copied: self.copied.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Summary of one sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Stale temp files removed before the walk
    pub purged: usize,
    /// Jobs handed to the worker pool
    pub submitted: usize,
    /// Lossless files transcoded
    pub converted: usize,
    /// Lossy files copied
    pub copied: usize,
    /// Files whose output already existed
    pub skipped: usize,
    /// Jobs that ended in an error
    pub failed: usize,
}

impl SyncReport {
    /// Whether the run wrote anything to the destination
    pub fn did_work(&self) -> bool {
        self.converted > 0 || self.copied > 0
    }
}
