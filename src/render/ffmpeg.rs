use super::{
    run_with_timeout, EncodedAudio, Encoder, RawAudio, RenderError, Result, BITRATE, DEFAULT_TIMEOUT,
    OUTPUT_CHANNELS, SAMPLE_RATE,
};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// ffmpeg-backed MP3 encoder and mixer
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    pub program: String,
    pub sample_rate: u32,
    pub channels: u8,
    pub bitrate: String,
    pub timeout: Duration,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Ffmpeg {
            program: "ffmpeg".to_string(),
            sample_rate: SAMPLE_RATE,
            channels: OUTPUT_CHANNELS,
            bitrate: BITRATE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Ffmpeg {
    /// Arguments for encoding `inputs` into `out`.
    ///
    /// One input is a straight transcode; more than one goes through `amix`
    /// with normalization off, so every input keeps its rendered level.
    fn args(&self, inputs: &[RawAudio], duration: Option<f64>, out: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into()];
        for input in inputs {
            args.push("-i".into());
            args.push(input.path().into());
        }
        if let Some(seconds) = duration {
            args.push("-t".into());
            args.push(seconds.to_string().into());
        }
        if inputs.len() > 1 {
            args.push("-filter_complex".into());
            args.push(format!("amix=inputs={}:duration=longest:normalize=0", inputs.len()).into());
        }
        let output: [OsString; 7] = [
            "-ar".into(),
            self.sample_rate.to_string().into(),
            "-ac".into(),
            self.channels.to_string().into(),
            "-b:a".into(),
            self.bitrate.clone().into(),
            out.into(),
        ];
        args.extend(output);
        args
    }
}

impl Encoder for Ffmpeg {
    fn encode(&self, inputs: &[RawAudio], duration: Option<f64>, out: &Path) -> Result<EncodedAudio> {
        if inputs.is_empty() {
            return Err(RenderError::NoInputs);
        }

        let mut command = Command::new(&self.program);
        command.args(self.args(inputs, duration, out));
        run_with_timeout(command, self.timeout)?;

        Ok(EncodedAudio::new(out))
    }
}
