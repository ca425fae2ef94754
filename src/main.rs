//! musicsplit command-line entry point
//!
//! Usage:
//!   musicsplit [FILE] [--config musicsplit.yaml] [--soundfont bank.sf2]
//!     [--midi-dir midi] [--audio-dir audio] [--manifest songs.js]
//!     [--jobs N] [--profile standard|extended] [--duration SECS]
//!     [--timeout SECS] [-v | -q]

use clap::Parser;
use log::{error, info};
use musicsplit::batch::{discover_inputs, Pipeline};
use musicsplit::config::Config;
use musicsplit::logging::{init_logging, parse_level};
use musicsplit::manifest::write_manifest;
use musicsplit::render::{Ffmpeg, FluidSynth};
use musicsplit::soundfont::{default_locations, find_soundfont};
use musicsplit::{ClassifierProfile, ComposeOptions, SetupError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "musicsplit.yaml";

#[derive(Debug, Parser)]
#[command(name = "musicsplit")]
#[command(about = "Render MIDI songs into per-instrument-group and cumulative layer MP3s")]
struct Cli {
    /// Process only this file instead of scanning the midi directory
    file: Option<PathBuf>,

    /// YAML config file (default: ./musicsplit.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Soundfont (.sf2) to render with; overrides discovery
    #[arg(long)]
    soundfont: Option<PathBuf>,

    #[arg(long)]
    midi_dir: Option<PathBuf>,

    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Where to write songs.js
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Songs rendered concurrently
    #[arg(long)]
    jobs: Option<usize>,

    /// Program classification table
    #[arg(long)]
    profile: Option<ClassifierProfile>,

    /// Trim every encoded file to this many seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Seconds before an external tool invocation is abandoned
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            // The logger may not be up yet
            eprintln!("musicsplit: {}", e);
            ExitCode::from(2)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, SetupError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => Config::from_file(Path::new(DEFAULT_CONFIG))?,
        None => Config::default(),
    };

    if let Some(soundfont) = &cli.soundfont {
        config.soundfont = Some(soundfont.clone());
    }
    if let Some(dir) = &cli.midi_dir {
        config.midi_dir = dir.clone();
    }
    if let Some(dir) = &cli.audio_dir {
        config.audio_dir = dir.clone();
    }
    if let Some(path) = &cli.manifest {
        config.manifest = path.clone();
    }
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }
    config.jobs = cli.jobs.or(config.jobs);
    config.duration = cli.duration.or(config.duration);
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    } else if cli.quiet {
        config.log_level = "warn".to_string();
    }

    Ok(config)
}

/// Returns whether every song built
fn run(cli: Cli) -> Result<bool, SetupError> {
    let config = load_config(&cli)?;
    init_logging(parse_level(&config.log_level)?, config.log_config.as_deref())?;

    let project_dir = config
        .midi_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let soundfont = find_soundfont(config.soundfont.as_deref(), &default_locations(&project_dir))?;
    info!("Using soundfont: {}", soundfont.display());

    let files = match &cli.file {
        Some(file) if file.is_file() => vec![file.clone()],
        Some(file) => return Err(SetupError::InputNotFound(file.clone())),
        None => discover_inputs(&config.midi_dir)?,
    };
    if files.is_empty() {
        info!("No MIDI files found in {}", config.midi_dir.display());
        return Ok(true);
    }
    info!("Found {} MIDI file(s), output to {}", files.len(), config.audio_dir.display());

    let synth = FluidSynth {
        program: config.fluidsynth.clone(),
        soundfont,
        sample_rate: config.sample_rate,
        timeout: config.timeout(),
    };
    let encoder = Ffmpeg {
        program: config.ffmpeg.clone(),
        sample_rate: config.sample_rate,
        bitrate: config.bitrate.clone(),
        timeout: config.timeout(),
        ..Ffmpeg::default()
    };
    let options = ComposeOptions {
        profile: config.profile,
        duration: config.duration,
    };
    let pipeline = Pipeline::new(
        Box::new(synth),
        Box::new(encoder),
        config.audio_dir.clone(),
        config.audio_prefix.clone(),
        options,
    );

    let report = pipeline.run(&files, config.jobs)?;

    // A single-file run would clobber the full song list
    if cli.file.is_none() {
        write_manifest(&report.songs, &config.manifest).map_err(|source| SetupError::Manifest {
            path: config.manifest.clone(),
            source,
        })?;
        info!("{} song(s) written to {}", report.songs.len(), config.manifest.display());
    }

    info!("Done! {}/{} files processed successfully", report.songs.len(), report.total());
    if !report.failures.is_empty() {
        error!("{} song(s) failed:", report.failures.len());
        for failure in &report.failures {
            error!("  {}: {}", failure.file, failure.reason);
        }
    }

    Ok(report.failures.is_empty())
}
