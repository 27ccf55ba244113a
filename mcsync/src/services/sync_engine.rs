//! Sync engine
//!
//! Wires one sync run together:
//!
//! 1. Validate the source, reject overlapping trees, create the destination
//! 2. Start the worker pool
//! 3. Purge stale temp files under the destination
//! 4. Walk the source tree on a blocking thread, submitting jobs
//! 5. Wait for every job (join barrier) and report the counts
//!
//! Per-file failures are counted, never returned. Only problems that stop the
//! run as a whole surface as [`SyncError`].

use crate::models::{SyncReport, SyncStats};
use crate::services::conversion_scheduler::{ConversionScheduler, JobHandler};
use crate::services::job_runner::JobRunner;
use crate::services::path_mirror::{canonical_or_self, is_within, PathMirror};
use crate::services::temp_files::stale_purge;
use mcsync_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Run-level errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Source directory not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Source is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    #[error("Failed to read source directory {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create destination directory {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source and destination overlap; the walk would feed on its own output
    #[error("Source {source_dir} and destination {destination} overlap")]
    OverlappingTrees {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One-shot sync of a source tree into a destination tree
pub struct SyncEngine<H: JobHandler = JobRunner> {
    handler: Arc<H>,
    workers: usize,
}

impl SyncEngine<JobRunner> {
    /// Engine using the configured external tools and pool size
    pub fn from_config(config: &TomlConfig) -> Self {
        Self::new(Arc::new(JobRunner::from_config(config)), config.sync.workers)
    }
}

impl<H: JobHandler> SyncEngine<H> {
    pub fn new(handler: Arc<H>, workers: usize) -> Self {
        Self { handler, workers }
    }

    pub async fn run(&self, source: &Path, destination: &Path) -> Result<SyncReport, SyncError> {
        match tokio::fs::metadata(source).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(SyncError::SourceNotDirectory(source.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::SourceMissing(source.to_path_buf()));
            }
            Err(e) => {
                return Err(SyncError::SourceUnreadable {
                    path: source.to_path_buf(),
                    source: e,
                });
            }
        }

        // Nothing is created before this check
        let source_root = canonical_or_self(source);
        let dest_root = canonical_or_self(destination);
        if is_within(&dest_root, &source_root) || is_within(&source_root, &dest_root) {
            return Err(SyncError::OverlappingTrees {
                source_dir: source_root,
                destination: dest_root,
            });
        }

        tokio::fs::create_dir_all(&dest_root)
            .await
            .map_err(|e| SyncError::Destination {
                path: destination.to_path_buf(),
                source: e,
            })?;

        info!(
            source = %source_root.display(),
            destination = %dest_root.display(),
            workers = self.workers,
            "Starting sync"
        );

        let stats = Arc::new(SyncStats::new());
        let scheduler = ConversionScheduler::start(
            Arc::clone(&self.handler),
            self.workers,
            Arc::clone(&stats),
        );

        let walked = async {
            let purge_root = dest_root.clone();
            let purged = tokio::task::spawn_blocking(move || stale_purge(&purge_root)).await?;
            stats.record_purged(purged);
            if purged > 0 {
                info!(count = purged, "Removed stale temp files");
            }

            let mirror = PathMirror::new(scheduler.sender());
            tokio::task::spawn_blocking(move || mirror.mirror(&source_root, &dest_root)).await
        }
        .await;

        debug!("Walk finished, waiting for outstanding jobs");
        let report = scheduler.shutdown().await;
        walked?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversionJob, JobOutcome};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingHandler {
        jobs: Mutex<Vec<ConversionJob>>,
    }

    #[async_trait]
    impl JobHandler for RecordingHandler {
        async fn handle(&self, job: ConversionJob) -> JobOutcome {
            fs::write(&job.destination, b"out").unwrap();
            self.jobs.lock().unwrap().push(job);
            JobOutcome::Copied
        }
    }

    #[tokio::test]
    async fn test_missing_source_rejected() {
        let dst = TempDir::new().unwrap();
        let engine = SyncEngine::new(Arc::new(RecordingHandler::default()), 2);

        let result = engine.run(Path::new("/nonexistent/mcsync-src"), dst.path()).await;
        assert!(matches!(result, Err(SyncError::SourceMissing(_))));
    }

    #[tokio::test]
    async fn test_file_source_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.mp3");
        fs::write(&file, b"x").unwrap();
        let engine = SyncEngine::new(Arc::new(RecordingHandler::default()), 2);

        let result = engine.run(&file, &dir.path().join("out")).await;
        assert!(matches!(result, Err(SyncError::SourceNotDirectory(_))));
    }

    #[tokio::test]
    async fn test_destination_inside_source_rejected() {
        let src = TempDir::new().unwrap();
        let engine = SyncEngine::new(Arc::new(RecordingHandler::default()), 2);

        let result = engine.run(src.path(), &src.path().join("mirror")).await;
        assert!(matches!(result, Err(SyncError::OverlappingTrees { .. })));
        assert!(!src.path().join("mirror").exists());

        let nested = src.path().join("deep/er/mirror");
        let result = engine.run(src.path(), &nested).await;
        assert!(matches!(result, Err(SyncError::OverlappingTrees { .. })));
        assert!(!src.path().join("deep").exists());
    }

    #[tokio::test]
    async fn test_source_inside_destination_rejected() {
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(dst.path().join("music")).unwrap();
        let engine = SyncEngine::new(Arc::new(RecordingHandler::default()), 2);

        let result = engine.run(&dst.path().join("music"), dst.path()).await;
        assert!(matches!(result, Err(SyncError::OverlappingTrees { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_source_is_not_reported_missing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.mp3");
        fs::write(&file, b"x").unwrap();
        let engine = SyncEngine::new(Arc::new(RecordingHandler::default()), 2);

        // A path through a regular file fails with ENOTDIR, not NotFound
        let result = engine.run(&file.join("inner"), &dir.path().join("out")).await;
        assert!(matches!(result, Err(SyncError::SourceUnreadable { .. })));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_run_purges_then_walks() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("b.mp3"), b"x").unwrap();
        fs::write(dst.path().join("old.mp3.tmp"), b"partial").unwrap();

        let handler = Arc::new(RecordingHandler::default());
        let engine = SyncEngine::new(Arc::clone(&handler), 2);
        let report = engine.run(src.path(), dst.path()).await.unwrap();

        assert_eq!(report.purged, 1);
        assert_eq!(report.submitted, 1);
        assert_eq!(report.copied, 1);
        assert!(!dst.path().join("old.mp3.tmp").exists());
        assert_eq!(handler.jobs.lock().unwrap().len(), 1);

        let again = engine.run(src.path(), dst.path()).await.unwrap();
        assert_eq!(again.submitted, 0);
        assert_eq!(again.skipped, 1);
        assert!(!again.did_work());
    }
}
