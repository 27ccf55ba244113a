//! Encoder metadata arguments
//!
//! Maps a [`TagRecord`] and an optional cover-art file onto the encoder's
//! ID3 flags. Absent fields contribute nothing; no record at all yields no
//! metadata arguments.

use crate::models::{ExtendedTag, TagRecord};
use std::path::Path;

/// Ordered metadata arguments for one encoder invocation
///
/// Order: title, artist, album, year, comment, track[/total], genre,
/// cover art, then one custom frame per extended tag in [`ExtendedTag`]
/// order.
pub fn encoder_tag_arguments(tags: Option<&TagRecord>, cover_art: Option<&Path>) -> Vec<String> {
    let mut args = Vec::new();

    let Some(tags) = tags else {
        return args;
    };

    push_flag(&mut args, "--tt", tags.title.as_deref());
    push_flag(&mut args, "--ta", tags.artist.as_deref());
    push_flag(&mut args, "--tl", tags.album.as_deref());
    push_flag(&mut args, "--ty", tags.year.map(|y| y.to_string()).as_deref());
    push_flag(&mut args, "--tc", tags.comment.as_deref());

    if let Some(track) = tags.track {
        let value = match tags.track_total {
            Some(total) => format!("{}/{}", track, total),
            None => track.to_string(),
        };
        push_flag(&mut args, "--tn", Some(&value));
    }

    push_flag(&mut args, "--tg", tags.genre.as_deref());

    if let Some(path) = cover_art {
        args.push("--ti".to_string());
        args.push(path.to_string_lossy().into_owned());
    }

    for (tag, value) in &tags.extended_tags {
        if let Some(frame) = custom_frame(*tag) {
            args.push("--tv".to_string());
            args.push(format!("{}={}", frame, value));
        }
    }

    args
}

/// ID3v2 frame carrying an extended tag; energy level has none
fn custom_frame(tag: ExtendedTag) -> Option<&'static str> {
    match tag {
        ExtendedTag::Bpm => Some("TBPM"),
        ExtendedTag::InitialKey => Some("TKEY"),
        ExtendedTag::Rating => Some("POPM"),
        ExtendedTag::EnergyLevel => None,
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn full_record() -> TagRecord {
        let mut extended_tags = BTreeMap::new();
        extended_tags.insert(ExtendedTag::EnergyLevel, "6".to_string());
        extended_tags.insert(ExtendedTag::Rating, "5".to_string());
        extended_tags.insert(ExtendedTag::InitialKey, "Am".to_string());
        extended_tags.insert(ExtendedTag::Bpm, "124".to_string());

        TagRecord {
            title: Some("Song".to_string()),
            artist: Some("Artist".to_string()),
            album: Some("Album".to_string()),
            year: Some(2001),
            comment: Some("Note".to_string()),
            track: Some(4),
            track_total: Some(11),
            genre: Some("House".to_string()),
            extended_tags,
            ..TagRecord::default()
        }
    }

    #[test]
    fn test_full_argument_order() {
        let args = encoder_tag_arguments(Some(&full_record()), Some(Path::new("/tmp/song.art")));
        assert_eq!(
            args,
            vec![
                "--tt", "Song", "--ta", "Artist", "--tl", "Album", "--ty", "2001", "--tc", "Note",
                "--tn", "4/11", "--tg", "House", "--ti", "/tmp/song.art", "--tv", "TBPM=124",
                "--tv", "TKEY=Am", "--tv", "POPM=5",
            ]
        );
    }

    #[test]
    fn test_no_record_no_arguments() {
        assert!(encoder_tag_arguments(None, None).is_empty());
        assert!(encoder_tag_arguments(None, Some(Path::new("/tmp/a.art"))).is_empty());
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let record = TagRecord {
            artist: Some("Only Artist".to_string()),
            ..TagRecord::default()
        };
        assert_eq!(encoder_tag_arguments(Some(&record), None), vec!["--ta", "Only Artist"]);
    }

    #[test]
    fn test_track_without_total() {
        let record = TagRecord {
            track: Some(7),
            ..TagRecord::default()
        };
        assert_eq!(encoder_tag_arguments(Some(&record), None), vec!["--tn", "7"]);
    }

    #[test]
    fn test_total_without_track_is_ignored() {
        let record = TagRecord {
            track_total: Some(12),
            ..TagRecord::default()
        };
        assert!(encoder_tag_arguments(Some(&record), None).is_empty());
    }

    #[test]
    fn test_energy_level_has_no_frame() {
        let mut record = TagRecord::default();
        record.extended_tags.insert(ExtendedTag::EnergyLevel, "8".to_string());
        assert!(encoder_tag_arguments(Some(&record), None).is_empty());
    }

    #[test]
    fn test_arguments_are_deterministic() {
        let record = full_record();
        assert_eq!(
            encoder_tag_arguments(Some(&record), None),
            encoder_tag_arguments(Some(&record), None)
        );
    }
}
