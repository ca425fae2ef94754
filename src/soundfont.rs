//! Soundfont discovery
//!
//! An explicitly configured soundfont must exist. Otherwise a list of
//! conventional locations is searched and the first `.sf2` found (in file
//! name order within a directory) is used.

use crate::error::SetupError;
use log::debug;
use std::path::{Path, PathBuf};

/// Where to look for a soundfont, in priority order
#[derive(Debug, Clone)]
pub enum SearchLocation {
    /// Any `.sf2` directly inside this directory
    Directory(PathBuf),
    /// This exact file
    File(PathBuf),
}

/// Conventional soundfont locations, relative ones resolved against `base`
/// (the project directory holding `midi/`)
pub fn default_locations(base: &Path) -> Vec<SearchLocation> {
    let mut locations = vec![
        SearchLocation::Directory(PathBuf::from(".")),
        SearchLocation::Directory(base.to_path_buf()),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        locations.push(SearchLocation::File(
            Path::new(&home).join(".fluidsynth").join("default_sound_font.sf2"),
        ));
    }
    for dir in [
        "/usr/local/share/soundfonts",
        "/opt/homebrew/share/soundfonts",
        "/usr/share/sounds/sf2",
        "/usr/share/soundfonts",
    ] {
        locations.push(SearchLocation::Directory(PathBuf::from(dir)));
    }
    locations
}

/// Resolve the soundfont to render with
pub fn find_soundfont(
    explicit: Option<&Path>,
    locations: &[SearchLocation],
) -> Result<PathBuf, SetupError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(SetupError::SoundfontNotFound(path.to_path_buf()))
        };
    }

    for location in locations {
        debug!("looking for soundfont in {:?}", location);
        let found = match location {
            SearchLocation::File(path) => Some(path.clone()).filter(|p| p.is_file()),
            SearchLocation::Directory(dir) => first_sf2_in(dir),
        };
        if let Some(path) = found {
            return Ok(path);
        }
    }

    Err(SetupError::NoSoundfont)
}

fn first_sf2_in(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_sf2_extension(path))
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

fn has_sf2_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("sf2"))
        .unwrap_or(false)
}
