//! Tag extraction from the external probe tool
//!
//! Runs `probe -f <path>` and turns its `Key: Value` text report into a
//! [`TagRecord`]. A probe that cannot run, exits non-zero, or prints
//! non-UTF-8 output yields no tags; the caller carries on without them.
//!
//! Parsing is a pure function of the report text:
//! - each line is split on its first colon, both halves trimmed
//! - labels outside the [`TagKey`] vocabulary are dropped
//! - empty values are dropped
//! - only the first occurrence of a label is kept (multi-stream reports
//!   repeat labels per stream)

use crate::models::{
    CoverImage, ExtendedTag, FormatType, ImageMimeType, TagFields, TagKey, TagRecord,
};
use crate::services::conversion_executor::with_timeout;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Probe tool errors
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Probe binary could not be started (missing, not executable)
    #[error("Failed to run probe {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Probe exited unsuccessfully
    #[error("Probe exited with status {status:?}: {stderr}")]
    Exit { status: Option<i32>, stderr: String },

    /// Probe output is not valid UTF-8
    #[error("Probe output is not valid UTF-8")]
    InvalidUtf8,

    /// Probe did not finish in time
    #[error("Probe timed out after {0:?}")]
    TimedOut(Duration),
}

/// Source of probe reports
///
/// Implemented by [`MediaInfoProbe`] for the real tool.
#[async_trait]
pub trait TagProbe: Send + Sync {
    /// Full text report for one media file
    async fn report(&self, path: &Path) -> Result<String, ProbeError>;
}

/// Probe backed by an external `mediainfo`-compatible binary
pub struct MediaInfoProbe {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl MediaInfoProbe {
    pub fn new(binary: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TagProbe for MediaInfoProbe {
    async fn report(&self, path: &Path) -> Result<String, ProbeError> {
        let run = Command::new(&self.binary)
            .arg("-f")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match with_timeout(self.timeout, run).await {
            Some(result) => result.map_err(|source| ProbeError::Spawn {
                binary: self.binary.clone(),
                source,
            })?,
            None => return Err(ProbeError::TimedOut(self.timeout.unwrap_or_default())),
        };

        if !output.status.success() {
            return Err(ProbeError::Exit {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ProbeError::InvalidUtf8)
    }
}

/// Tag extractor service
#[derive(Clone)]
pub struct TagExtractor {
    probe: Arc<dyn TagProbe>,
}

impl TagExtractor {
    pub fn new(probe: Arc<dyn TagProbe>) -> Self {
        Self { probe }
    }

    /// Probe a file and parse its report
    ///
    /// Returns `None` when the probe fails; that is never fatal.
    pub async fn extract(&self, path: &Path) -> Option<TagRecord> {
        match self.probe.report(path).await {
            Ok(report) => {
                let record = parse_tag_record(&report);
                debug!(
                    file = %path.display(),
                    format = ?record.format,
                    title = ?record.title,
                    artist = ?record.artist,
                    has_cover = record.cover_image.is_some(),
                    "Extracted tags"
                );
                Some(record)
            }
            Err(e) => {
                warn!(file = %path.display(), "Probe failed, continuing without tags: {}", e);
                None
            }
        }
    }
}

/// Recognized fields of a probe report, first occurrence of each label
pub fn parse_probe_report(report: &str) -> TagFields {
    let mut fields = TagFields::new();

    for line in report.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some(key) = TagKey::from_label(label.trim()) else {
            continue;
        };

        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        fields.entry(key).or_insert_with(|| value.to_string());
    }

    fields
}

/// Parse a probe report straight into a tag record
pub fn parse_tag_record(report: &str) -> TagRecord {
    build_tag_record(&parse_probe_report(report))
}

/// Apply the per-field resolution rules
pub fn build_tag_record(fields: &TagFields) -> TagRecord {
    TagRecord {
        format: fields
            .get(&TagKey::Format)
            .map(|s| FormatType::from_label(s))
            .unwrap_or_default(),
        title: resolve_title(fields),
        artist: fields.get(&TagKey::Performer).cloned(),
        album: fields.get(&TagKey::Album).cloned(),
        year: fields.get(&TagKey::RecordedDate).and_then(|s| s.parse().ok()),
        comment: fields.get(&TagKey::Comment).cloned(),
        track: fields.get(&TagKey::TrackPosition).and_then(|s| s.parse().ok()),
        track_total: fields
            .get(&TagKey::TrackTotal)
            .and_then(|s| parse_track_total(s)),
        genre: fields.get(&TagKey::Genre).cloned(),
        cover_image: resolve_cover(fields),
        extended_tags: resolve_extended_tags(fields),
    }
}

/// Title, falling back to the track name
fn resolve_title(fields: &TagFields) -> Option<String> {
    let title = fields.get(&TagKey::Title);
    let track_name = fields.get(&TagKey::TrackName);

    if let (Some(title), Some(track_name)) = (title, track_name) {
        if title != track_name {
            warn!(title = %title, track_name = %track_name, "Title and track name don't match");
        }
    }

    title.or(track_name).cloned()
}

/// Track total as a bare integer, or the number before the slash of `N / M`
pub fn parse_track_total(raw: &str) -> Option<u32> {
    if let Ok(total) = raw.parse() {
        return Some(total);
    }

    raw.split('/').next().and_then(|n| n.trim().parse().ok())
}

/// Cover art, present only with both a recognized MIME type and decodable data
fn resolve_cover(fields: &TagFields) -> Option<CoverImage> {
    let mime = fields
        .get(&TagKey::CoverMime)
        .and_then(|m| ImageMimeType::from_mime(first_picture(m)))?;
    let encoded = fields.get(&TagKey::CoverData)?;

    match BASE64.decode(first_picture(encoded)) {
        Ok(data) if !data.is_empty() => Some(CoverImage { data, mime }),
        Ok(_) => None,
        Err(e) => {
            debug!("Ignoring undecodable cover art: {}", e);
            None
        }
    }
}

/// First entry of a per-picture field
///
/// Several embedded pictures are reported joined by " / ", in the same order
/// for every cover field.
fn first_picture(value: &str) -> &str {
    value.split(" / ").next().unwrap_or_default().trim()
}

fn resolve_extended_tags(fields: &TagFields) -> BTreeMap<ExtendedTag, String> {
    let mut tags = BTreeMap::new();

    if let Some(bpm) = fields.get(&TagKey::Bpm).and_then(|s| normalize_bpm(s)) {
        tags.insert(ExtendedTag::Bpm, bpm);
    }

    if let Some(rating) = fields.get(&TagKey::Rating) {
        tags.insert(ExtendedTag::Rating, rating.clone());
    }

    let energy = fields
        .get(&TagKey::EnergyLevel)
        .or_else(|| fields.get(&TagKey::EnergyLevelLower));
    if let Some(energy) = energy {
        tags.insert(ExtendedTag::EnergyLevel, energy.clone());
    }

    let key = fields
        .get(&TagKey::InitialKey)
        .or_else(|| fields.get(&TagKey::InitialKeyLower));
    if let Some(key) = key {
        tags.insert(ExtendedTag::InitialKey, key.clone());
    }

    tags
}

/// Integer BPM stays integral, float BPM is re-rendered as a float (always
/// with a fractional part), anything else is dropped
fn normalize_bpm(raw: &str) -> Option<String> {
    if let Ok(bpm) = raw.parse::<i64>() {
        return Some(bpm.to_string());
    }

    raw.parse::<f64>()
        .ok()
        .filter(|bpm| bpm.is_finite())
        .map(|bpm| format!("{:?}", bpm))
}
