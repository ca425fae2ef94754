//! Batch processing
//!
//! Runs the per-song pipeline over a list of score files on a bounded worker
//! pool. Songs share nothing: each gets its own scratch directory and its own
//! staging directory, and a failing song only adds an entry to the report.
//!
//! # Publishing
//! Encoded files are written to a hidden staging directory inside the audio
//! root and moved onto `<audio_dir>/<id>/` only once every file of the song
//! has been produced. A song is therefore either published complete or not
//! at all; a failed rebuild leaves the previous output in place.

use crate::compose::{compose_song, ComposeOptions};
use crate::error::{SetupError, SongError};
use crate::render::{Encoder, Synthesizer};
use crate::score::Score;
use crate::song::{SongMeta, SongRecord};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A song that could not be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongFailure {
    pub file: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records of the songs that built, in input order
    pub songs: Vec<SongRecord>,
    pub failures: Vec<SongFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.songs.len() + self.failures.len()
    }
}

/// List the score files of a directory, sorted by file name
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    let scan_error = |source| SetupError::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_error)? {
        let path = entry.map_err(scan_error)?.path();
        if path.is_file() && is_midi_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Indices of `files` bucketed by song id, buckets in order of first
/// appearance. Files with an empty id each get a bucket of their own.
fn group_by_id(files: &[PathBuf]) -> Vec<Vec<usize>> {
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (index, path) in files.iter().enumerate() {
        let id = SongMeta::from_file_name(&file_name_of(path)).id;
        if id.is_empty() {
            buckets.push(vec![index]);
            continue;
        }
        match by_id.get(&id) {
            Some(&bucket) => buckets[bucket].push(index),
            None => {
                by_id.insert(id, buckets.len());
                buckets.push(vec![index]);
            }
        }
    }
    buckets
}

/// Swap a fully built staging directory into place.
///
/// A previous build is moved aside first and only deleted once the new one
/// sits at `target`; if the swap fails it is moved back.
fn publish(staging: &Path, target: &Path) -> std::io::Result<()> {
    if !target.exists() {
        return std::fs::rename(staging, target);
    }

    let mut backup = target.as_os_str().to_os_string();
    backup.push(".previous");
    let backup = PathBuf::from(backup);
    if backup.exists() {
        std::fs::remove_dir_all(&backup)?;
    }

    std::fs::rename(target, &backup)?;
    if let Err(e) = std::fs::rename(staging, target) {
        std::fs::rename(&backup, target)?;
        return Err(e);
    }
    std::fs::remove_dir_all(&backup)
}

/// Everything needed to turn score files into published songs
pub struct Pipeline {
    synth: Box<dyn Synthesizer>,
    encoder: Box<dyn Encoder>,
    audio_dir: PathBuf,
    audio_prefix: String,
    options: ComposeOptions,
}

impl Pipeline {
    pub fn new(
        synth: Box<dyn Synthesizer>,
        encoder: Box<dyn Encoder>,
        audio_dir: impl Into<PathBuf>,
        audio_prefix: impl Into<String>,
        options: ComposeOptions,
    ) -> Self {
        Pipeline {
            synth,
            encoder,
            audio_dir: audio_dir.into(),
            audio_prefix: audio_prefix.into(),
            options,
        }
    }

    /// Output directory of a song
    pub fn song_dir(&self, id: &str) -> PathBuf {
        self.audio_dir.join(id)
    }

    /// Build and publish one song
    pub fn process_file(&self, path: &Path) -> Result<SongRecord, SongError> {
        let meta = SongMeta::from_file_name(&file_name_of(path));
        if meta.id.is_empty() {
            return Err(SongError::EmptyId);
        }

        let bytes = std::fs::read(path).map_err(|source| SongError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let score = Score::from_bytes(&bytes)?;

        std::fs::create_dir_all(&self.audio_dir).map_err(SongError::Workspace)?;

        // Both directories are removed when dropped, on every exit path
        let scratch = tempfile::Builder::new()
            .prefix("musicsplit-")
            .tempdir()
            .map_err(SongError::Workspace)?;
        let staging = tempfile::Builder::new()
            .prefix(&format!(".staging-{}-", meta.id))
            .tempdir_in(&self.audio_dir)
            .map_err(SongError::Workspace)?;

        let layers = compose_song(
            &score,
            self.synth.as_ref(),
            self.encoder.as_ref(),
            scratch.path(),
            staging.path(),
            &self.options,
        )?;

        publish(staging.path(), &self.song_dir(&meta.id)).map_err(SongError::Workspace)?;

        Ok(SongRecord::new(&meta, &layers, &self.audio_prefix))
    }

    /// Files sharing one song id, in input order. The first file that
    /// builds owns the id; the ones after it are rejected as duplicates.
    fn process_claimants(
        &self,
        files: &[PathBuf],
        indices: &[usize],
    ) -> Vec<(usize, String, Result<SongRecord, SongError>)> {
        let mut claimed = false;
        indices
            .iter()
            .map(|&index| {
                let path = &files[index];
                let file = file_name_of(path);
                let outcome = if claimed {
                    Err(SongError::DuplicateId(SongMeta::from_file_name(&file).id))
                } else {
                    info!("Processing: {}", file);
                    self.process_file(path)
                };
                claimed |= outcome.is_ok();
                (index, file, outcome)
            })
            .collect()
    }

    /// Process `files` on a pool of `jobs` workers (all CPUs when `None`)
    pub fn run(&self, files: &[PathBuf], jobs: Option<usize>) -> Result<BatchReport, SetupError> {
        std::fs::create_dir_all(&self.audio_dir).map_err(|source| SetupError::OutputDir {
            path: self.audio_dir.clone(),
            source,
        })?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.unwrap_or(0))
            .build()
            .map_err(|e| SetupError::ThreadPool(e.to_string()))?;

        let outcomes: Vec<(String, Result<SongRecord, SongError>)> = pool.install(|| {
            let mut outcomes: Vec<(usize, String, Result<SongRecord, SongError>)> =
                group_by_id(files)
                    .par_iter()
                    .flat_map_iter(|indices| self.process_claimants(files, indices))
                    .collect();
            outcomes.sort_by_key(|(index, _, _)| *index);
            outcomes.into_iter().map(|(_, file, outcome)| (file, outcome)).collect()
        });

        let mut report = BatchReport::default();
        for (file, outcome) in outcomes {
            match outcome {
                Ok(record) => {
                    info!(
                        "  {}: {} present groups, {} layers",
                        file,
                        record.present_count(),
                        record.layers.len()
                    );
                    report.songs.push(record);
                }
                Err(e) => {
                    warn!("  {}: FAILED: {}", file, e);
                    report.failures.push(SongFailure {
                        file,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }
}
