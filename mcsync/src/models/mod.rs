//! Data models for the sync engine
//!
//! - File-name classification and output naming
//! - Typed tag record built from probe reports
//! - Conversion jobs and run statistics

pub mod audio_file;
pub mod job;
pub mod tag_record;

pub use audio_file::{
    output_file_name, AudioExtension, FileExtensionClass, TARGET_EXTENSION, TEMP_EXTENSION,
};
pub use job::{ConversionJob, JobOutcome, SyncReport, SyncStats};
pub use tag_record::{
    CoverImage, ExtendedTag, FormatType, ImageMimeType, TagFields, TagKey, TagRecord,
};
