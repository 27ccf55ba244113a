//! mcsync - music collection sync
//!
//! Mirrors SOURCE into DESTINATION: lossless audio is transcoded to MP3 with
//! tags carried over, lossy audio is copied, and files already present at the
//! destination are skipped.
//!
//! Exit status reflects whether the run completed, not whether every file
//! converted; per-file failures are logged and counted.

use anyhow::{bail, Context, Result};
use clap::Parser;
use mcsync::SyncEngine;
use mcsync_common::config::{load_config, resolve_config_path, write_toml_config};
use mcsync_common::logging::init_tracing;
use std::path::PathBuf;
use tracing::{info, warn};

/// Command-line arguments for mcsync
#[derive(Parser, Debug)]
#[command(name = "mcsync")]
#[command(about = "Mirror a music collection, transcoding lossless files to MP3")]
#[command(version)]
struct Args {
    /// Source collection root
    #[arg(required_unless_present = "write_config")]
    source: Option<PathBuf>,

    /// Destination root (created if missing)
    #[arg(required_unless_present = "write_config")]
    destination: Option<PathBuf>,

    /// Configuration file (falls back to MCSYNC_CONFIG, then the platform config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Concurrent jobs, overrides sync.workers
    #[arg(short, long, value_name = "N", env = "MCSYNC_JOBS")]
    jobs: Option<usize>,

    /// Per-job timeout in seconds (0 disables), overrides sync.job_timeout_secs
    #[arg(long, value_name = "SECS")]
    job_timeout: Option<u64>,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(jobs) = args.jobs {
        config.sync.workers = jobs;
    }
    if let Some(secs) = args.job_timeout {
        config.sync.job_timeout_secs = secs;
    }
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging).context("Failed to initialize logging")?;

    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No configuration file found, using built-in defaults"),
    }

    if let Some(path) = args.write_config {
        write_toml_config(&config, &path)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let (Some(source), Some(destination)) = (args.source, args.destination) else {
        bail!("SOURCE and DESTINATION are required");
    };

    info!("Starting mcsync {}", mcsync::build_info());

    let engine = SyncEngine::from_config(&config);
    let report = engine
        .run(&source, &destination)
        .await
        .context("Sync failed")?;

    info!(
        purged = report.purged,
        submitted = report.submitted,
        converted = report.converted,
        copied = report.copied,
        skipped = report.skipped,
        failed = report.failed,
        "Sync complete"
    );
    if !report.did_work() && report.failed == 0 {
        info!("Destination already up to date");
    }

    Ok(())
}
