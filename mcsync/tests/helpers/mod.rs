//! Test Helper Utilities
//!
//! Fake external tools as small POSIX shell scripts:
//! - probe: prints `<file>.info` if that sidecar exists, else exits 1
//! - decoder: `cat`s the source to stdout
//! - encoder: writes `ARGS [a] [b] ...` as the first output line, then the
//!   input bytes (from stdin when the input argument is `-`)
//! - failing / noisy / hanging encoders for the error paths

#![allow(dead_code)]

use mcsync_common::config::TomlConfig;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

const PROBE: &str = r#"#!/bin/sh
[ -f "$2.info" ] || exit 1
cat "$2.info"
"#;

const DECODER: &str = r#"#!/bin/sh
cat "$2"
"#;

const ENCODER: &str = r#"#!/bin/sh
input=""
out=""
for arg in "$@"; do
  input="$out"
  out="$arg"
done
{
  printf 'ARGS'
  for arg in "$@"; do printf ' [%s]' "$arg"; done
  printf '\n'
  if [ "$input" = "-" ]; then cat; else cat "$input"; fi
} > "$out"
"#;

const FAILING_ENCODER: &str = r#"#!/bin/sh
for arg in "$@"; do out="$arg"; done
printf 'partial' > "$out"
echo "encoder exploded" >&2
exit 2
"#;

const NOISY_ENCODER: &str = r#"#!/bin/sh
for arg in "$@"; do out="$arg"; done
printf 'looks fine' > "$out"
echo "warning: clipping detected" >&2
exit 0
"#;

const HANGING_ENCODER: &str = r#"#!/bin/sh
for arg in "$@"; do out="$arg"; done
printf 'partial' > "$out"
exec sleep 30
"#;

/// Paths of the installed fake tools
pub struct FakeTools {
    _dir: TempDir,
    pub probe: PathBuf,
    pub decoder: PathBuf,
    pub encoder: PathBuf,
    pub failing_encoder: PathBuf,
    pub noisy_encoder: PathBuf,
    pub hanging_encoder: PathBuf,
}

static TOOLS: OnceLock<FakeTools> = OnceLock::new();

/// Install the fake tools once per test binary
///
/// Written once up front so no script is still open for writing while
/// another test thread spawns it.
pub fn fake_tools() -> &'static FakeTools {
    TOOLS.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let install = |name: &str, body: &str| {
            let path = dir.path().join(name);
            fs::write(&path, body).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        };

        FakeTools {
            probe: install("probe", PROBE),
            decoder: install("decoder", DECODER),
            encoder: install("encoder", ENCODER),
            failing_encoder: install("failing-encoder", FAILING_ENCODER),
            noisy_encoder: install("noisy-encoder", NOISY_ENCODER),
            hanging_encoder: install("hanging-encoder", HANGING_ENCODER),
            _dir: dir,
        }
    })
}

/// Configuration wired to the fake tools
pub fn test_config() -> TomlConfig {
    let tools = fake_tools();
    let mut config = TomlConfig::default();
    config.tools.probe = tools.probe.clone();
    config.tools.decoder = tools.decoder.clone();
    config.tools.encoder = tools.encoder.clone();
    config.sync.workers = 4;
    config.sync.job_timeout_secs = 30;
    config
}

/// Write a file, creating parent directories
pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// The `ARGS ...` line the fake encoder wrote
pub fn encoder_args(output: &Path) -> String {
    let bytes = fs::read(output).unwrap();
    let line_end = bytes.iter().position(|b| *b == b'\n').unwrap();
    String::from_utf8(bytes[..line_end].to_vec()).unwrap()
}

/// The audio bytes the fake encoder wrote after its `ARGS` line
pub fn encoded_body(output: &Path) -> Vec<u8> {
    let bytes = fs::read(output).unwrap();
    let line_end = bytes.iter().position(|b| *b == b'\n').unwrap();
    bytes[line_end + 1..].to_vec()
}

/// Value following `flag` in an `ARGS` line
pub fn arg_after(args: &str, flag: &str) -> Option<String> {
    let marker = format!("[{}] [", flag);
    let start = args.find(&marker)? + marker.len();
    let end = args[start..].find(']')? + start;
    Some(args[start..end].to_string())
}

/// Every file under `root` with the temp extension
pub fn temp_files_under(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map(|ext| ext == "tmp").unwrap_or(false))
        .collect()
}
