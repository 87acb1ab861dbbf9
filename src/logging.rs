//! log4rs setup for harness runs.
use crate::error::HarnessError;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const PATTERN: &str = "{d(%H:%M:%S)} {l} {t} - {m}{n}";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Also log to this file when set.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: None,
        }
    }
}

/// Builds the log4rs configuration for `config` without installing it.
///
/// # Errors
/// If the log file cannot be opened.
pub fn build_config(config: &LogConfig) -> Result<Config, HarnessError> {
    let stderr = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    let mut builder =
        Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));
    let mut root = Root::builder().appender("stderr");
    if let Some(path) = &config.file {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{l} - {m}{n}")))
            .build(path)
            .map_err(|source| HarnessError::Io {
                path: path.clone(),
                source,
            })?;
        builder = builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }
    builder
        .build(root.build(config.level))
        .map_err(|err| HarnessError::Logging(err.to_string()))
}

/// Installs the global logger. Fails if a logger is already installed.
///
/// # Errors
/// If the configuration is invalid or a logger is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), HarnessError> {
    let log_config = build_config(config)?;
    log4rs::init_config(log_config)
        .map(|_handle| ())
        .map_err(|err| HarnessError::Logging(err.to_string()))
}
