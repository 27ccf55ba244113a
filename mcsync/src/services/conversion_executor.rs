//! Conversion executor
//!
//! Runs the external encoder for one lossless source, writing to a temp
//! output path. Formats the encoder reads natively are passed directly;
//! FLAC is decoded by the external decoder and piped into the encoder's
//! standard input.
//!
//! Success means the encoder exited zero *and* wrote nothing to stderr.
//! Cover art is materialized to a temp file for the encoder to embed and is
//! removed when the call returns, whatever the outcome.

use crate::models::{AudioExtension, CoverImage, TagRecord};
use crate::services::argument_builder::encoder_tag_arguments;
use mcsync_common::config::ToolsConfig;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

/// Extension of materialized cover-art files
const COVER_ART_EXTENSION: &str = "art";

/// Conversion errors
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Tool binary could not be started
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoder reported failure (non-zero exit or error output)
    #[error("Encoder failed (status {status:?}): {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    /// Conversion exceeded the per-job timeout
    #[error("Conversion timed out after {0:?}")]
    TimedOut(Duration),

    /// Pipe or file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the encoder receives its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Encoder reads the source file itself
    Direct,
    /// Decoder output is piped into the encoder's stdin
    Piped,
}

impl InputMode {
    pub fn for_extension(ext: AudioExtension) -> Self {
        if ext.needs_decoder() {
            InputMode::Piped
        } else {
            InputMode::Direct
        }
    }
}

/// Await `fut`, giving up after `limit` when one is set
///
/// Returns `None` on expiry. Dropping the future kills any child spawned
/// with `kill_on_drop`.
pub(crate) async fn with_timeout<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Cover art written out for the encoder, removed on drop
#[derive(Debug)]
pub struct CoverArtFile {
    path: PathBuf,
}

impl CoverArtFile {
    /// Write cover art to a uniquely named file in the system temp directory
    pub async fn write(source_name: &str, cover: &CoverImage) -> std::io::Result<Self> {
        Self::write_in(&std::env::temp_dir(), source_name, cover).await
    }

    pub async fn write_in(
        dir: &Path,
        source_name: &str,
        cover: &CoverImage,
    ) -> std::io::Result<Self> {
        let file_name = format!(
            "{}-{}.{}",
            escape_file_name(source_name),
            Uuid::new_v4(),
            COVER_ART_EXTENSION
        );
        // Guard exists before the write so a partial file is still removed
        let art = Self {
            path: dir.join(file_name),
        };
        tokio::fs::write(&art.path, &cover.data).await?;
        Ok(art)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CoverArtFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), "Failed to remove cover art: {}", e);
            }
        }
    }
}

/// Replace characters that are awkward in file names or shell arguments
pub fn escape_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Runs the external decoder and encoder
#[derive(Debug, Clone)]
pub struct ConversionExecutor {
    decoder: PathBuf,
    encoder: PathBuf,
    encoder_flags: Vec<String>,
    timeout: Option<Duration>,
}

impl ConversionExecutor {
    pub fn new(tools: &ToolsConfig, timeout: Option<Duration>) -> Self {
        Self {
            decoder: tools.decoder.clone(),
            encoder: tools.encoder.clone(),
            encoder_flags: tools.encoder_flags.clone(),
            timeout,
        }
    }

    /// Transcode `source` into `temp_output`
    ///
    /// The final output path is never touched here; promoting the temp file
    /// is the caller's job.
    pub async fn transcode(
        &self,
        source: &Path,
        ext: AudioExtension,
        tags: Option<&TagRecord>,
        temp_output: &Path,
    ) -> Result<(), ConversionError> {
        let cover_art = match tags.and_then(|t| t.cover_image.as_ref()) {
            Some(cover) => {
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match CoverArtFile::write(&name, cover).await {
                    Ok(art) => Some(art),
                    Err(e) => {
                        warn!(
                            source = %source.display(),
                            "Failed to write cover art, encoding without it: {}", e
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let tag_args = encoder_tag_arguments(tags, cover_art.as_ref().map(CoverArtFile::path));
        let mode = InputMode::for_extension(ext);

        debug!(
            source = %source.display(),
            output = %temp_output.display(),
            mode = ?mode,
            tag_args = tag_args.len(),
            "Running encoder"
        );

        let run = async {
            match mode {
                InputMode::Direct => self.encode_direct(source, temp_output, &tag_args).await,
                InputMode::Piped => self.encode_piped(source, temp_output, &tag_args).await,
            }
        };

        match with_timeout(self.timeout, run).await {
            Some(result) => result,
            None => Err(ConversionError::TimedOut(self.timeout.unwrap_or_default())),
        }
        // cover_art dropped here, on every path
    }

    fn encoder_command(&self, input: &Path, output: &Path, tag_args: &[String]) -> Command {
        let mut cmd = Command::new(&self.encoder);
        cmd.args(&self.encoder_flags)
            .args(tag_args)
            .arg(input)
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn encode_direct(
        &self,
        source: &Path,
        output: &Path,
        tag_args: &[String],
    ) -> Result<(), ConversionError> {
        let result = self
            .encoder_command(source, output, tag_args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ConversionError::Spawn {
                tool: self.encoder.clone(),
                source,
            })?;

        check_encoder_output(&result)
    }

    async fn encode_piped(
        &self,
        source: &Path,
        output: &Path,
        tag_args: &[String],
    ) -> Result<(), ConversionError> {
        let mut decoder = Command::new(&self.decoder)
            .arg("-cd")
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConversionError::Spawn {
                tool: self.decoder.clone(),
                source,
            })?;

        let decoded = decoder.stdout.take().ok_or_else(|| {
            ConversionError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "decoder stdout not captured",
            ))
        })?;
        let encoder_stdin: Stdio = decoded.try_into()?;

        let result = self
            .encoder_command(Path::new("-"), output, tag_args)
            .stdin(encoder_stdin)
            .output()
            .await
            .map_err(|source| ConversionError::Spawn {
                tool: self.encoder.clone(),
                source,
            })?;

        // Only the encoder decides success; the decoder is just reaped
        match decoder.wait().await {
            Ok(status) if !status.success() => {
                debug!(
                    source = %source.display(),
                    status = ?status.code(),
                    "Decoder exited unsuccessfully"
                );
            }
            Ok(_) => {}
            Err(e) => debug!(source = %source.display(), "Failed to wait for decoder: {}", e),
        }

        check_encoder_output(&result)
    }
}

fn check_encoder_output(output: &std::process::Output) -> Result<(), ConversionError> {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if output.status.success() && stderr.is_empty() {
        Ok(())
    } else {
        Err(ConversionError::Failed {
            status: output.status.code(),
            stderr,
        })
    }
}
