//! Logging system initialization
//!
//! Sets up the `tracing` subscriber from the `[logging]` config section:
//! level filter, text or JSON format, console or (optionally daily-rotated) file output.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;
use crate::errors::{LinkwatchError, Result};

const DEFAULT_LOG_FILE_NAME: &str = "linkwatch.log";

/// Initialize logging system based on configuration
///
/// Must be called once during startup, after the configuration has been loaded.
/// The returned `WorkerGuard` has to be kept alive for the duration of the
/// program so buffered log lines are flushed on exit.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let log_file = config.file.as_deref().filter(|f| !f.is_empty());

    let writer: Box<dyn std::io::Write + Send + Sync> = match log_file {
        Some(log_file) if config.enable_rotation => Box::new(rolling_appender(log_file, config)?),
        Some(log_file) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|e| {
                    LinkwatchError::file_operation(format!(
                        "Failed to open log file {}: {}",
                        log_file, e
                    ))
                })?;
            Box::new(file)
        }
        None => Box::new(std::io::stdout()),
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level).map_err(|e| {
        LinkwatchError::validation(format!("Invalid log level '{}': {}", config.level, e))
    })?;

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(log_file.is_none());

    let init_result = if config.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };
    init_result.map_err(|e| {
        LinkwatchError::validation(format!("Failed to install log subscriber: {}", e))
    })?;

    Ok(guard)
}

fn rolling_appender(log_file: &str, config: &LoggingConfig) -> Result<rolling::RollingFileAppender> {
    let path = Path::new(log_file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_NAME);

    rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(filename.trim_end_matches(".log"))
        .filename_suffix("log")
        .max_log_files(config.max_backups.max(1) as usize)
        .build(dir)
        .map_err(|e| {
            LinkwatchError::file_operation(format!(
                "Failed to create rolling log appender in {}: {}",
                dir.display(),
                e
            ))
        })
}
