use super::{RenderError, Result};
use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Characters of stderr kept in failure reports
const STDERR_TAIL: usize = 2000;

/// Run a command to completion, killing it once `timeout` elapses.
///
/// stdout is discarded. stderr goes to an anonymous temp file rather than a
/// pipe so a chatty child can never block on a full pipe while we poll; its
/// tail is attached to the error when the command fails.
pub fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<()> {
    let program = command.get_program().to_string_lossy().into_owned();

    let mut stderr_log = tempfile::tempfile()?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr_log.try_clone()?));

    debug!("running {:?}", command);
    let mut child = command.spawn().map_err(|source| RenderError::Spawn {
        program: program.clone(),
        source,
    })?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderError::Timeout { program, timeout });
        }
        thread::sleep(POLL_INTERVAL);
    };

    if status.success() {
        return Ok(());
    }

    Err(RenderError::Failed {
        program,
        status,
        stderr: read_tail(&mut stderr_log),
    })
}

fn read_tail(log: &mut File) -> String {
    let mut bytes = Vec::new();
    if log.seek(SeekFrom::Start(0)).is_err() || log.read_to_end(&mut bytes).is_err() {
        return String::new();
    }
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim();
    let skip = text.chars().count().saturating_sub(STDERR_TAIL);
    text.chars().skip(skip).collect()
}
