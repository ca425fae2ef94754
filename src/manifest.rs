//! `songs.js` manifest
//!
//! The front-end loads the song list as a plain script defining a global
//! `SONGS` array, so the manifest is JSON wrapped in a `const` declaration.

use crate::song::SongRecord;
use std::io;
use std::path::Path;

const HEADER: &str = "// Auto-generated by musicsplit\n";

/// Render the manifest script for `songs`
pub fn render_manifest(songs: &[SongRecord]) -> serde_json::Result<String> {
    let json = serde_json::to_string_pretty(songs)?;
    Ok(format!("{}const SONGS = {};\n", HEADER, json))
}

/// Write the manifest script to `path`
pub fn write_manifest(songs: &[SongRecord], path: &Path) -> io::Result<()> {
    let script = render_manifest(songs).map_err(io::Error::from)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, script)
}
