//! Build configuration
//!
//! Loaded from an optional YAML file; every field has a default so an empty
//! (or missing) file gives a working setup. Command-line flags are applied on
//! top by the binary.
//!
//! ```yaml
//! midi_dir: midi
//! audio_dir: site/audio
//! audio_prefix: audio
//! manifest: site/songs.js
//! soundfont: GeneralUser-GS.sf2
//! profile: extended
//! jobs: 4
//! timeout_secs: 120
//! duration: 30
//! ```

use crate::classify::ClassifierProfile;
use crate::error::SetupError;
use crate::render::{BITRATE, SAMPLE_RATE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory scanned for .mid/.midi files
    pub midi_dir: PathBuf,
    /// Root of the per-song output directories
    pub audio_dir: PathBuf,
    /// Path prefix used for file references in song records
    pub audio_prefix: String,
    /// Where songs.js is written
    pub manifest: PathBuf,
    /// Instrument bank; discovered when absent
    pub soundfont: Option<PathBuf>,
    pub profile: ClassifierProfile,
    /// Songs processed concurrently; all CPUs when absent
    pub jobs: Option<usize>,
    /// Per external invocation
    pub timeout_secs: u64,
    /// Trim encoded audio to this many seconds
    pub duration: Option<f64>,
    pub fluidsynth: String,
    pub ffmpeg: String,
    pub sample_rate: u32,
    pub bitrate: String,
    pub log_level: String,
    /// log4rs YAML file; overrides `log_level` when set
    pub log_config: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            midi_dir: PathBuf::from("midi"),
            audio_dir: PathBuf::from("audio"),
            audio_prefix: "audio".to_string(),
            manifest: PathBuf::from("songs.js"),
            soundfont: None,
            profile: ClassifierProfile::default(),
            jobs: None,
            timeout_secs: 60,
            duration: None,
            fluidsynth: "fluidsynth".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            sample_rate: SAMPLE_RATE,
            bitrate: BITRATE.to_string(),
            log_level: "info".to_string(),
            log_config: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config, SetupError> {
        let content = std::fs::read_to_string(path).map_err(|e| SetupError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Config::from_yaml(&content).map_err(|reason| SetupError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Config, String> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
