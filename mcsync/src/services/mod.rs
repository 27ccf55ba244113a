//! Sync services
//!
//! - `tag_extractor`: probe tool invocation and report parsing
//! - `argument_builder`: tag record to encoder metadata flags
//! - `conversion_executor`: direct and piped encoder runs
//! - `temp_files`: temp naming, promotion, stale purge
//! - `path_mirror`: source tree walk and job submission
//! - `conversion_scheduler`: bounded worker pool and join barrier
//! - `job_runner`: per-file transcode/copy handler
//! - `sync_engine`: one complete sync run

pub mod argument_builder;
pub mod conversion_executor;
pub mod conversion_scheduler;
pub mod job_runner;
pub mod path_mirror;
pub mod sync_engine;
pub mod tag_extractor;
pub mod temp_files;

pub use argument_builder::encoder_tag_arguments;
pub use conversion_executor::{ConversionError, ConversionExecutor, CoverArtFile, InputMode};
pub use conversion_scheduler::{ConversionScheduler, JobHandler, JobSender};
pub use job_runner::{JobError, JobRunner};
pub use path_mirror::PathMirror;
pub use sync_engine::{SyncEngine, SyncError};
pub use tag_extractor::{MediaInfoProbe, ProbeError, TagExtractor, TagProbe};
