//! Configuration loading and resolution
//!
//! The configuration file is optional. Every field has a built-in default, so
//! a missing file (or a file that only sets a few keys) still yields a usable
//! configuration.
//!
//! # Resolution order
//!
//! 1. Command-line `--config` path (highest priority)
//! 2. `MCSYNC_CONFIG` environment variable
//! 3. `<platform config dir>/mcsync/config.toml`, when it exists
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "MCSYNC_CONFIG";

/// Complete configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// External tool locations and encoder preset
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Scheduler settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External collaborator binaries
///
/// Bare names are looked up through `PATH` when spawned.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Metadata probe, invoked as `probe -f <path>`
    #[serde(default = "default_probe")]
    pub probe: PathBuf,

    /// Decoder for containers the encoder cannot read, invoked as `decoder -cd <path>`
    #[serde(default = "default_decoder")]
    pub decoder: PathBuf,

    /// MP3 encoder
    #[serde(default = "default_encoder")]
    pub encoder: PathBuf,

    /// Flags passed to the encoder ahead of the metadata arguments
    #[serde(default = "default_encoder_flags")]
    pub encoder_flags: Vec<String>,
}

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Number of concurrent conversion/copy jobs
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Upper bound for one job's external processes, in seconds (0 = unbounded)
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_probe() -> PathBuf {
    PathBuf::from("mediainfo")
}

fn default_decoder() -> PathBuf {
    PathBuf::from("flac")
}

fn default_encoder() -> PathBuf {
    PathBuf::from("lame")
}

fn default_encoder_flags() -> Vec<String> {
    ["--silent", "-h", "--add-id3v2", "--noreplaygain", "-V", "0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_workers() -> usize {
    8
}

fn default_job_timeout_secs() -> u64 {
    1800
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            probe: default_probe(),
            decoder: default_decoder(),
            encoder: default_encoder(),
            encoder_flags: default_encoder_flags(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            job_timeout_secs: default_job_timeout_secs(),
        }
    }
}

impl SyncConfig {
    /// Per-job timeout, `None` when disabled
    pub fn job_timeout(&self) -> Option<Duration> {
        (self.job_timeout_secs > 0).then(|| Duration::from_secs(self.job_timeout_secs))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse configuration text, filling every missing key with its default
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sync.workers == 0 {
            return Err(Error::Config("sync.workers must be at least 1".to_string()));
        }

        let tools = [
            ("tools.probe", &self.tools.probe),
            ("tools.decoder", &self.tools.decoder),
            ("tools.encoder", &self.tools.encoder),
        ];
        for (key, path) in tools {
            if path.as_os_str().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
        }

        Ok(())
    }
}

/// Read and parse a configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    TomlConfig::from_toml_str(&content)
}

/// Default configuration file location for the platform
///
/// `~/.config/mcsync/config.toml` on Linux, the equivalent application
/// support folder elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mcsync").join("config.toml"))
}

/// Pick the configuration file to load, if any
///
/// An explicit path (command line, then environment) is returned whether or
/// not it exists; the platform default is only returned when present.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Load the effective configuration
///
/// An explicitly requested file that cannot be read or parsed is an error.
/// No file at all is not: defaults are used and a warning is logged.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_path) {
        Some(path) => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            warn!("No configuration file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write configuration atomically (temp sibling + rename)
///
/// Parent directories are created as needed.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}
