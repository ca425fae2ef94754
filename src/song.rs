//! Song identity and the published song record
//!
//! A song's id, title and artist all come from its file name:
//! `"Artist - Song Title.mid"` becomes id `artist-song-title`, title
//! `Song Title`, artist `Artist`. The record built from a composed song is
//! the output contract consumed by the web front-end.

use crate::compose::SongLayers;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static MIDI_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.midi?$").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_.]+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Turn a score file name into a URL- and folder-safe id
pub fn make_song_id(file_name: &str) -> String {
    let name = MIDI_EXTENSION.replace(file_name, "");
    let name = name.to_lowercase();
    let name = SEPARATORS.replace_all(&name, "-");
    let name = DISALLOWED.replace_all(&name, "");
    let name = HYPHEN_RUNS.replace_all(&name, "-");
    name.trim_matches('-').to_string()
}

/// Split `"Artist - Title"` into (artist, title).
///
/// Without a `" - "` separator the artist is absent and the title is the
/// whole base name. Extra separators stay in the title.
pub fn parse_file_name(file_name: &str) -> (Option<String>, String) {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parts: Vec<&str> = stem.split(" - ").map(str::trim).collect();
    match parts.as_slice() {
        [artist, rest @ ..] if !rest.is_empty() => (Some(artist.to_string()), rest.join(" - ")),
        _ => (None, stem.trim().to_string()),
    }
}

/// Identity of one song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongMeta {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
}

impl SongMeta {
    pub fn from_file_name(file_name: &str) -> Self {
        let (artist, title) = parse_file_name(file_name);
        SongMeta {
            id: make_song_id(file_name),
            title,
            artist,
        }
    }
}

/// Per-group entry of a song record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    pub file: String,
    pub present: bool,
}

/// Published description of one song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub groups: Vec<GroupEntry>,
    pub layers: Vec<String>,
}

impl SongRecord {
    /// Build the record for a composed song. File references are
    /// `<prefix>/<id>/<file name>`.
    pub fn new(meta: &SongMeta, layers: &SongLayers, prefix: &str) -> Self {
        let file_ref = |file_name: &str| {
            if prefix.is_empty() {
                format!("{}/{}", meta.id, file_name)
            } else {
                format!("{}/{}/{}", prefix.trim_end_matches('/'), meta.id, file_name)
            }
        };

        let groups = layers
            .groups
            .iter()
            .map(|g| GroupEntry {
                name: g.group.name().to_string(),
                file: file_ref(&g.file_name),
                present: g.present,
            })
            .collect();

        let layer_files = layers.layers.iter().map(|l| file_ref(&l.file_name)).collect();

        SongRecord {
            id: meta.id.clone(),
            title: meta.title.clone(),
            artist: meta.artist.clone(),
            groups,
            layers: layer_files,
        }
    }

    /// Number of groups with audible content
    pub fn present_count(&self) -> usize {
        self.groups.iter().filter(|g| g.present).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::InstrumentGroup;
    use crate::compose::{group_file_name, layer_file_name, GroupOutput, LayerOutput};

    #[test]
    fn test_song_id() {
        assert_eq!(make_song_id("Artist - Song Title.mid"), "artist-song-title");
        assert_eq!(make_song_id("my_song.v2.MIDI"), "my-song-v2");
        assert_eq!(make_song_id("  Rock & Roll!! .mid"), "rock-roll");
        assert_eq!(make_song_id("--Édith Piaf--.mid"), "dith-piaf");
        assert_eq!(make_song_id("!!!.mid"), "");
    }

    #[test]
    fn test_song_id_only_strips_midi_extension() {
        assert_eq!(make_song_id("track.kar"), "track-kar");
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("Artist - Song Title.mid"),
            (Some("Artist".to_string()), "Song Title".to_string())
        );
        assert_eq!(parse_file_name("Song Title.mid"), (None, "Song Title".to_string()));
        assert_eq!(
            parse_file_name("A - B - C.mid"),
            (Some("A".to_string()), "B - C".to_string())
        );
    }

    #[test]
    fn test_record_shape() {
        let layers = SongLayers {
            groups: InstrumentGroup::ALL
                .iter()
                .map(|g| GroupOutput {
                    group: *g,
                    present: *g == InstrumentGroup::Drums,
                    file_name: group_file_name(*g),
                })
                .collect(),
            layers: vec![LayerOutput {
                number: 1,
                groups: vec![InstrumentGroup::Drums],
                file_name: layer_file_name(1),
            }],
        };
        let record = SongRecord::new(&SongMeta::from_file_name("Beat.mid"), &layers, "audio");

        assert_eq!(record.id, "beat");
        assert_eq!(record.artist, None);
        assert_eq!(record.groups[0].file, "audio/beat/group-1-drums.mp3");
        assert_eq!(record.groups[0].name, "Drums+Perc");
        assert_eq!(record.layers, vec!["audio/beat/layer-1.mp3"]);
        assert_eq!(record.present_count(), 1);

        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 5);
        assert!(json["artist"].is_null());
        assert_eq!(json["groups"][0]["present"], true);
    }
}
