//! mcsync library interface
//!
//! Mirrors a music collection into a portable MP3 tree: lossless sources are
//! transcoded with their tags carried over, lossy sources are copied as-is,
//! and existing outputs are skipped so repeated runs are incremental.
//!
//! Exposes the engine for the `mcsync` binary and for integration testing.

pub mod models;
pub mod services;

pub use models::SyncReport;
pub use services::{SyncEngine, SyncError};

/// Build identification captured by `build.rs`
pub fn build_info() -> String {
    format!(
        "{} ({}, {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    )
}
