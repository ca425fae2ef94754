use super::{run_with_timeout, RawAudio, Result, Synthesizer, DEFAULT_TIMEOUT, SAMPLE_RATE};
use crate::score::Score;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// FluidSynth fast-render synthesizer
#[derive(Debug, Clone)]
pub struct FluidSynth {
    pub program: String,
    pub soundfont: PathBuf,
    pub sample_rate: u32,
    pub timeout: Duration,
}

impl FluidSynth {
    pub fn new(soundfont: impl Into<PathBuf>) -> Self {
        FluidSynth {
            program: "fluidsynth".to_string(),
            soundfont: soundfont.into(),
            sample_rate: SAMPLE_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Arguments for rendering `midi` into `wav`
    fn args(&self, midi: &Path, wav: &Path) -> Vec<OsString> {
        vec![
            "-ni".into(), // no MIDI input driver, no interactive shell
            "-F".into(),
            wav.into(),
            "-T".into(),
            "wav".into(),
            "-r".into(),
            self.sample_rate.to_string().into(),
            self.soundfont.clone().into(),
            midi.into(),
        ]
    }
}

impl Synthesizer for FluidSynth {
    fn render(&self, score: &Score, out: &Path) -> Result<RawAudio> {
        let midi = out.with_extension("mid");
        std::fs::write(&midi, score.to_bytes()?)?;

        let mut command = Command::new(&self.program);
        command.args(self.args(&midi, out));
        run_with_timeout(command, self.timeout)?;

        Ok(RawAudio::new(out))
    }
}
