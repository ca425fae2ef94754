//! Error types for a build run
//!
//! Failures come in two scopes: a [`SetupError`] stops the run before any
//! song is processed, a [`SongError`] fails one song and is recorded in the
//! batch report while the remaining songs carry on.

use crate::render::RenderError;
use crate::score::ScoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single song. The `Display` text is the reason reported for
/// the song.
#[derive(Debug, Error)]
pub enum SongError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed score: {0}")]
    Parse(#[from] ScoreError),
    #[error("file name yields an empty song id")]
    EmptyId,
    #[error("song id '{0}' already produced by another file")]
    DuplicateId(String),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("workspace error: {0}")]
    Workspace(#[source] std::io::Error),
}

/// Failure that aborts the whole run
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("soundfont not found: {0}")]
    SoundfontNotFound(PathBuf),
    #[error("no soundfont (.sf2) found; pass --soundfont or place a .sf2 file next to the midi directory")]
    NoSoundfont,
    #[error("cannot load config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),
    #[error("cannot scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to init logging: {0}")]
    Logging(String),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),
}
