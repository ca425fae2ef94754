//! MusicSplit
//!
//! Splits Standard MIDI Files into per-instrument-group audio and cumulative
//! layers, so a listener can hear an arrangement build up one instrument
//! family at a time.
//!
//! Pipeline per song: [`analysis`] assigns every channel to one of six
//! [`classify::InstrumentGroup`]s, [`filter`] isolates each group's channels
//! with exact timing, [`render`] synthesizes and encodes through external
//! tools, and [`compose`] builds the cumulative layers. [`batch`] runs that
//! over a directory of songs and [`manifest`] publishes the result.

pub mod analysis;
pub mod batch;
pub mod classify;
pub mod compose;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod manifest;
pub mod render;
pub mod score;
pub mod song;
pub mod soundfont;

// Re-export commonly used types
pub use batch::{BatchReport, Pipeline, SongFailure};
pub use classify::{ClassifierProfile, InstrumentGroup};
pub use compose::{compose_song, ComposeOptions, SongLayers};
pub use error::{SetupError, SongError};
pub use score::Score;
pub use song::SongRecord;
