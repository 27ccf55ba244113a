//! Typed tag record derived from one probe report
//!
//! The probe vocabulary is closed: [`TagKey`] lists every label the engine
//! understands, and [`TagRecord`] is built from those fields through explicit
//! per-field fallback rules.

use std::collections::{BTreeMap, HashMap};

/// Probe report labels the engine recognizes
///
/// Labels are matched exactly (after trimming), so `EnergyLevel` and its
/// lowercase variant are distinct keys resolved by a fallback rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKey {
    Title,
    TrackName,
    Performer,
    Album,
    TrackPosition,
    TrackTotal,
    Genre,
    RecordedDate,
    Comment,
    CoverMime,
    CoverData,
    Format,
    Bpm,
    Rating,
    EnergyLevel,
    EnergyLevelLower,
    InitialKey,
    InitialKeyLower,
}

impl TagKey {
    pub const ALL: [TagKey; 18] = [
        TagKey::Title,
        TagKey::TrackName,
        TagKey::Performer,
        TagKey::Album,
        TagKey::TrackPosition,
        TagKey::TrackTotal,
        TagKey::Genre,
        TagKey::RecordedDate,
        TagKey::Comment,
        TagKey::CoverMime,
        TagKey::CoverData,
        TagKey::Format,
        TagKey::Bpm,
        TagKey::Rating,
        TagKey::EnergyLevel,
        TagKey::EnergyLevelLower,
        TagKey::InitialKey,
        TagKey::InitialKeyLower,
    ];

    /// Label as it appears in the probe report
    pub fn label(&self) -> &'static str {
        match self {
            TagKey::Title => "Title",
            TagKey::TrackName => "Track name",
            TagKey::Performer => "Performer",
            TagKey::Album => "Album",
            TagKey::TrackPosition => "Track name/Position",
            TagKey::TrackTotal => "Track name/Total",
            TagKey::Genre => "Genre",
            TagKey::RecordedDate => "Recorded date",
            TagKey::Comment => "Comment",
            TagKey::CoverMime => "Cover MIME",
            TagKey::CoverData => "Cover_Data",
            TagKey::Format => "Format",
            TagKey::Bpm => "BPM",
            TagKey::Rating => "Rating",
            TagKey::EnergyLevel => "EnergyLevel",
            TagKey::EnergyLevelLower => "energylevel",
            TagKey::InitialKey => "Initial key",
            TagKey::InitialKeyLower => "initialkey",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.label() == label)
    }
}

/// Container/codec reported by the probe's `Format` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatType {
    Aiff,
    Wave,
    Flac,
    MpegAudio,
    Mpeg4,
    Ogg,
    #[default]
    Unsupported,
}

impl FormatType {
    pub fn from_label(label: &str) -> Self {
        match label {
            "AIFF" => FormatType::Aiff,
            "Wave" => FormatType::Wave,
            "FLAC" => FormatType::Flac,
            "MPEG Audio" => FormatType::MpegAudio,
            "MPEG-4" => FormatType::Mpeg4,
            "Ogg" => FormatType::Ogg,
            _ => FormatType::Unsupported,
        }
    }
}

/// Cover art MIME types the encoder can embed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
}

impl ImageMimeType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(ImageMimeType::Jpeg),
            "image/png" => Some(ImageMimeType::Png),
            "image/gif" => Some(ImageMimeType::Gif),
            _ => None,
        }
    }
}

/// Embedded cover art
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub data: Vec<u8>,
    pub mime: ImageMimeType,
}

/// Non-standard tags carried through as custom encoder frames
///
/// Declaration order is the order the encoder arguments are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtendedTag {
    Bpm,
    InitialKey,
    Rating,
    EnergyLevel,
}

/// Recognized fields of one probe report, first occurrence of each key only
pub type TagFields = HashMap<TagKey, String>;

/// Metadata of one source file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagRecord {
    pub format: FormatType,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub comment: Option<String>,
    pub track: Option<u32>,
    pub track_total: Option<u32>,
    pub genre: Option<String>,
    pub cover_image: Option<CoverImage>,
    pub extended_tags: BTreeMap<ExtendedTag, String>,
}
