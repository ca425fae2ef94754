//! Logging setup
//!
//! Library code logs through the `log` facade; the binary installs a
//! `log4rs` backend, either from a log4rs YAML file or as a plain stderr
//! console appender at the requested level.

use crate::error::SetupError;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const PATTERN: &str = "{d(%H:%M:%S)} {h({l:<5})} {m}{n}";

/// Parse a level name ("off", "error", ... "trace")
pub fn parse_level(level: &str) -> Result<LevelFilter, SetupError> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| SetupError::Logging(format!("unknown log level '{}'", level)))
}

/// Install the global logger
pub fn init_logging(level: LevelFilter, config_file: Option<&Path>) -> Result<(), SetupError> {
    if let Some(path) = config_file {
        return log4rs::init_file(path, Default::default())
            .map_err(|e| SetupError::Logging(format!("{}: {}", path.display(), e)));
    }

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| SetupError::Logging(e.to_string()))?;

    log4rs::init_config(config)
        .map(|_handle| ())
        .map_err(|e| SetupError::Logging(e.to_string()))
}
