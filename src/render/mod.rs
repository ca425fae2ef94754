//! Audio rendering
//!
//! Two capabilities sit between the layering pipeline and the outside world:
//!
//! - [`Synthesizer`]: turns a score into raw (uncompressed) audio using an
//!   instrument bank.
//! - [`Encoder`]: transcodes one raw input, or mixes several by plain
//!   summation, into the distributable format.
//!
//! The production implementations shell out to FluidSynth and ffmpeg
//! ([`FluidSynth`], [`Ffmpeg`]); tests substitute fakes.
//!
//! # Output format
//! - 44100 Hz, stereo, 192 kbit/s MP3
//! - Mixes are unweighted and un-normalized; clipping is accepted

mod ffmpeg;
mod fluidsynth;
mod process;

pub use ffmpeg::Ffmpeg;
pub use fluidsynth::FluidSynth;
pub use process::run_with_timeout;

use crate::score::{Score, ScoreError};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Sample rate of every render and encode
pub const SAMPLE_RATE: u32 = 44_100;

/// Channel count of encoded output
pub const OUTPUT_CHANNELS: u8 = 2;

/// Encoder bitrate
pub const BITRATE: &str = "192k";

/// Default per-invocation timeout for external tools
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("nothing to encode")]
    NoInputs,
    #[error("cannot write score for rendering: {0}")]
    Score(#[from] ScoreError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Raw audio file produced by a synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawAudio(PathBuf);

impl RawAudio {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RawAudio(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Encoded audio file ready for distribution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedAudio(PathBuf);

impl EncodedAudio {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EncodedAudio(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Offline score synthesis
pub trait Synthesizer: Send + Sync {
    /// Render `score` to raw audio at `out`. Any intermediate files go next
    /// to `out`, inside the caller's scratch directory.
    fn render(&self, score: &Score, out: &Path) -> Result<RawAudio>;
}

/// Transcoding and mixing
pub trait Encoder: Send + Sync {
    /// Encode `inputs` into `out`. A single input is transcoded as-is;
    /// several are summed to the length of the longest. `duration` trims
    /// the output to that many seconds.
    fn encode(&self, inputs: &[RawAudio], duration: Option<f64>, out: &Path) -> Result<EncodedAudio>;
}
