//! File-name classification
//!
//! Decides, from a directory entry's name, whether it is lossless audio to
//! transcode, lossy audio to copy, a directory to recurse into, or something
//! to ignore. Extension matching is case-insensitive.

use std::path::Path;

/// Reserved extension for in-progress output files
pub const TEMP_EXTENSION: &str = "tmp";

/// Extension of transcoded output files
pub const TARGET_EXTENSION: &str = "mp3";

/// Directory-listing artifacts that are never treated as media
pub const SENTINEL_FILE_NAMES: &[&str] = &[".DS_Store"];

/// Recognized audio file extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioExtension {
    Aiff,
    Aif,
    Wave,
    Wav,
    Flac,
    Mp3,
    M4a,
    Mp4,
    Ogg,
}

impl AudioExtension {
    /// Every recognized extension
    pub const ALL: [AudioExtension; 9] = [
        AudioExtension::Aiff,
        AudioExtension::Aif,
        AudioExtension::Wave,
        AudioExtension::Wav,
        AudioExtension::Flac,
        AudioExtension::Mp3,
        AudioExtension::M4a,
        AudioExtension::Mp4,
        AudioExtension::Ogg,
    ];

    /// Match an extension (without the dot), ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(ext))
    }

    /// Canonical lowercase spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioExtension::Aiff => "aiff",
            AudioExtension::Aif => "aif",
            AudioExtension::Wave => "wave",
            AudioExtension::Wav => "wav",
            AudioExtension::Flac => "flac",
            AudioExtension::Mp3 => "mp3",
            AudioExtension::M4a => "m4a",
            AudioExtension::Mp4 => "mp4",
            AudioExtension::Ogg => "ogg",
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(
            self,
            AudioExtension::Aiff
                | AudioExtension::Aif
                | AudioExtension::Wave
                | AudioExtension::Wav
                | AudioExtension::Flac
        )
    }

    /// Whether the encoder needs a separate decoder feeding it raw audio
    ///
    /// The encoder reads AIFF and WAV itself; FLAC has to be decoded first.
    pub fn needs_decoder(&self) -> bool {
        matches!(self, AudioExtension::Flac)
    }
}

/// Classification of one directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileExtensionClass {
    /// Transcode to the target format
    LosslessAudio(AudioExtension),
    /// Copy byte-for-byte
    LossyAudio(AudioExtension),
    /// Recurse into
    Directory,
    /// Ignore (sentinels, temp files, unsupported types)
    Unrecognized,
}

impl FileExtensionClass {
    /// Classify an entry by name, probing for directory-ness only when the
    /// name carries no recognized audio extension
    ///
    /// Order: sentinel names, reserved temp extension, audio extension,
    /// then directory probe.
    pub fn classify<F>(file_name: &str, is_directory: F) -> Self
    where
        F: FnOnce() -> bool,
    {
        if SENTINEL_FILE_NAMES.contains(&file_name) {
            return FileExtensionClass::Unrecognized;
        }

        if is_temp_file_name(file_name) {
            return FileExtensionClass::Unrecognized;
        }

        if let Some(ext) = audio_extension_of(file_name) {
            return if ext.is_lossless() {
                FileExtensionClass::LosslessAudio(ext)
            } else {
                FileExtensionClass::LossyAudio(ext)
            };
        }

        if is_directory() {
            FileExtensionClass::Directory
        } else {
            FileExtensionClass::Unrecognized
        }
    }
}

/// Recognized audio extension of a file name, if any
pub fn audio_extension_of(file_name: &str) -> Option<AudioExtension> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(AudioExtension::from_extension)
}

/// Whether the name carries the reserved temp extension
pub fn is_temp_file_name(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(TEMP_EXTENSION))
        .unwrap_or(false)
}

/// Destination file name for a source audio file
///
/// Lossless names get the target extension in place of their own; lossy
/// names are carried through unchanged.
pub fn output_file_name(file_name: &str, ext: AudioExtension) -> String {
    if !ext.is_lossless() {
        return file_name.to_string();
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());

    format!("{}.{}", stem, TARGET_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_file(name: &str) -> FileExtensionClass {
        FileExtensionClass::classify(name, || false)
    }

    #[test]
    fn test_lossless_extensions() {
        for name in ["a.aiff", "a.aif", "a.wave", "a.wav", "a.flac"] {
            assert!(
                matches!(classify_file(name), FileExtensionClass::LosslessAudio(_)),
                "{} should be lossless",
                name
            );
        }
    }

    #[test]
    fn test_lossy_extensions() {
        for name in ["a.mp3", "a.m4a", "a.mp4", "a.ogg"] {
            assert!(
                matches!(classify_file(name), FileExtensionClass::LossyAudio(_)),
                "{} should be lossy",
                name
            );
        }
    }

    #[test]
    fn test_extension_match_ignores_case() {
        assert_eq!(
            classify_file("Track.FLAC"),
            FileExtensionClass::LosslessAudio(AudioExtension::Flac)
        );
        assert_eq!(
            classify_file("Track.Mp3"),
            FileExtensionClass::LossyAudio(AudioExtension::Mp3)
        );
    }

    #[test]
    fn test_temp_and_sentinel_never_probed() {
        let probe = || -> bool { panic!("directory probe must not run") };
        assert_eq!(
            FileExtensionClass::classify("a.mp3.tmp", probe),
            FileExtensionClass::Unrecognized
        );
        assert_eq!(
            FileExtensionClass::classify(".DS_Store", probe),
            FileExtensionClass::Unrecognized
        );
    }

    #[test]
    fn test_audio_extension_skips_directory_probe() {
        let probe = || -> bool { panic!("directory probe must not run") };
        assert_eq!(
            FileExtensionClass::classify("b.wav", probe),
            FileExtensionClass::LosslessAudio(AudioExtension::Wav)
        );
    }

    #[test]
    fn test_unknown_extension_probes_directory() {
        assert_eq!(
            FileExtensionClass::classify("Disc 1", || true),
            FileExtensionClass::Directory
        );
        assert_eq!(
            FileExtensionClass::classify("cover.jpg", || false),
            FileExtensionClass::Unrecognized
        );
    }

    #[test]
    fn test_output_name_for_lossless() {
        assert_eq!(output_file_name("01 Intro.flac", AudioExtension::Flac), "01 Intro.mp3");
        assert_eq!(output_file_name("take.2.aiff", AudioExtension::Aiff), "take.2.mp3");
    }

    #[test]
    fn test_output_name_for_lossy_unchanged() {
        assert_eq!(output_file_name("song.m4a", AudioExtension::M4a), "song.m4a");
        assert_eq!(output_file_name("song.MP3", AudioExtension::Mp3), "song.MP3");
    }

    #[test]
    fn test_only_flac_is_piped() {
        assert!(AudioExtension::Flac.needs_decoder());
        assert!(!AudioExtension::Wav.needs_decoder());
        assert!(!AudioExtension::Aiff.needs_decoder());
    }
}
