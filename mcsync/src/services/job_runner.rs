//! Per-file job execution
//!
//! Lossless sources are probed for tags and transcoded; lossy sources are
//! copied. Either way the output goes to a temp path and is renamed into
//! place only on success. On failure the temp file is left for the next
//! run's stale purge.

use crate::models::{AudioExtension, ConversionJob, FileExtensionClass, JobOutcome};
use crate::services::conversion_executor::{ConversionError, ConversionExecutor};
use crate::services::conversion_scheduler::JobHandler;
use crate::services::tag_extractor::{MediaInfoProbe, TagExtractor};
use crate::services::temp_files::{finalize, temp_path_for};
use async_trait::async_trait;
use mcsync_common::config::TomlConfig;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Job errors
#[derive(Debug, Error)]
pub enum JobError {
    /// Transcode failed
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Copying a lossy source failed
    #[error("Failed to copy to {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming the temp file into place failed
    #[error("Failed to finalize {path}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Job was built for a non-audio entry
    #[error("Not an audio file: {0}")]
    NotAudio(PathBuf),
}

/// Production job handler
pub struct JobRunner {
    extractor: TagExtractor,
    executor: ConversionExecutor,
}

impl JobRunner {
    pub fn new(extractor: TagExtractor, executor: ConversionExecutor) -> Self {
        Self {
            extractor,
            executor,
        }
    }

    /// Runner wired to the configured external tools
    pub fn from_config(config: &TomlConfig) -> Self {
        let timeout = config.sync.job_timeout();
        let probe = MediaInfoProbe::new(config.tools.probe.clone(), timeout);

        Self::new(
            TagExtractor::new(Arc::new(probe)),
            ConversionExecutor::new(&config.tools, timeout),
        )
    }

    /// Run one job to completion
    pub async fn run(&self, job: &ConversionJob) -> Result<JobOutcome, JobError> {
        match job.class {
            FileExtensionClass::LosslessAudio(ext) => {
                self.convert(job, ext).await?;
                Ok(JobOutcome::Converted)
            }
            FileExtensionClass::LossyAudio(_) => {
                self.copy(job).await?;
                Ok(JobOutcome::Copied)
            }
            _ => Err(JobError::NotAudio(job.source.clone())),
        }
    }

    async fn convert(&self, job: &ConversionJob, ext: AudioExtension) -> Result<(), JobError> {
        info!(
            "converting {} from: {} to: {}",
            job.display_name(),
            parent_display(&job.source),
            parent_display(&job.destination)
        );

        let tags = self.extractor.extract(&job.source).await;
        let temp = temp_path_for(&job.destination);

        self.executor
            .transcode(&job.source, ext, tags.as_ref(), &temp)
            .await?;

        finalize(&temp, &job.destination)
            .await
            .map_err(|source| JobError::Finalize {
                path: job.destination.clone(),
                source,
            })
    }

    async fn copy(&self, job: &ConversionJob) -> Result<(), JobError> {
        info!(
            "copying {} from: {} to: {}",
            job.display_name(),
            parent_display(&job.source),
            parent_display(&job.destination)
        );

        let temp = temp_path_for(&job.destination);

        tokio::fs::copy(&job.source, &temp)
            .await
            .map_err(|source| JobError::Copy {
                path: temp.clone(),
                source,
            })?;

        finalize(&temp, &job.destination)
            .await
            .map_err(|source| JobError::Finalize {
                path: job.destination.clone(),
                source,
            })
    }
}

#[async_trait]
impl JobHandler for JobRunner {
    async fn handle(&self, job: ConversionJob) -> JobOutcome {
        match self.run(&job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(source = %job.source.display(), "Error converting file: {}", e);
                JobOutcome::Failed
            }
        }
    }
}

fn parent_display(path: &std::path::Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn runner() -> JobRunner {
        let mut config = TomlConfig::default();
        config.tools.probe = PathBuf::from("/nonexistent/mcsync-probe");
        config.tools.encoder = PathBuf::from("/nonexistent/mcsync-encoder");
        JobRunner::from_config(&config)
    }

    #[tokio::test]
    async fn test_lossy_copy_is_byte_identical() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let source = src.path().join("b.m4a");
        fs::write(&source, b"\x00\x01lossy bytes\xff").unwrap();

        let job = ConversionJob::new(
            source,
            dst.path().join("b.m4a"),
            FileExtensionClass::LossyAudio(AudioExtension::M4a),
        );

        assert_eq!(runner().handle(job).await, JobOutcome::Copied);
        assert_eq!(fs::read(dst.path().join("b.m4a")).unwrap(), b"\x00\x01lossy bytes\xff");
        assert!(!dst.path().join("b.m4a.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_lossy_source_fails() {
        let dst = TempDir::new().unwrap();
        let job = ConversionJob::new(
            PathBuf::from("/nonexistent/b.mp3"),
            dst.path().join("b.mp3"),
            FileExtensionClass::LossyAudio(AudioExtension::Mp3),
        );

        assert_eq!(runner().handle(job).await, JobOutcome::Failed);
        assert!(!dst.path().join("b.mp3").exists());
    }

    #[tokio::test]
    async fn test_failed_transcode_never_promotes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let source = src.path().join("a.wav");
        fs::write(&source, b"RIFF").unwrap();

        let job = ConversionJob::new(
            source,
            dst.path().join("a.mp3"),
            FileExtensionClass::LosslessAudio(AudioExtension::Wav),
        );

        let result = runner().run(&job).await;
        assert!(matches!(result, Err(JobError::Conversion(ConversionError::Spawn { .. }))));
        assert!(!dst.path().join("a.mp3").exists());
    }

    #[tokio::test]
    async fn test_non_audio_job_rejected() {
        let job = ConversionJob::new(
            PathBuf::from("/src/dir"),
            PathBuf::from("/dst/dir"),
            FileExtensionClass::Directory,
        );
        assert!(matches!(runner().run(&job).await, Err(JobError::NotAudio(_))));
    }
}
