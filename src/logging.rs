//! Logging initialization.
//!
//! Interactive editor: logs to `<state>/logs/stagemerge-{datetime}.log` so
//! output does not tear the terminal UI.
//! Headless commands: logs to stderr, keeping stdout free for results.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Keeps the non-blocking writer alive; dropping it flushes buffered logs.
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file, when logging to a file
    pub log_file_path: Option<PathBuf>,
}

/// Effective filter directive: `--debug` wins over the configured level.
pub fn log_level(config: &Config, debug_override: bool) -> String {
    if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    }
}

/// Log file name for a session started at `now`.
pub fn log_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("stagemerge-{}.log", now.format("%Y%m%dT%H%M%SZ"))
}

/// Whether this run should log to a file rather than stderr.
pub fn logs_to_file(config: &Config, is_tui_mode: bool) -> bool {
    is_tui_mode && config.logging.to_file
}

pub fn init_logging(
    config: &Config,
    is_tui_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| log_level(config, debug_override)),
    );

    if logs_to_file(config, is_tui_mode) {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)?;

        let log_filename = log_file_name(chrono::Utc::now());
        let log_file_path = logs_dir.join(&log_filename);
        let (writer, guard) = file_writer(&logs_dir, &log_filename);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();

        Ok(LoggingHandle {
            _guard: Some(guard),
            log_file_path: Some(log_file_path),
        })
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();

        Ok(LoggingHandle {
            _guard: None,
            log_file_path: None,
        })
    }
}

fn file_writer(
    logs_dir: &Path,
    log_filename: &str,
) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let file_appender = tracing_appender::rolling::never(logs_dir, log_filename);
    tracing_appender::non_blocking(file_appender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name_format() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(log_file_name(at), "stagemerge-20260304T050607Z.log");
    }

    #[test]
    fn test_debug_flag_overrides_level() {
        let mut config = Config::default();
        config.logging.level = "warn".to_string();

        assert_eq!(log_level(&config, false), "warn");
        assert_eq!(log_level(&config, true), "debug");
    }

    #[test]
    fn test_only_tui_with_file_logging_writes_file() {
        let mut config = Config::default();
        assert!(logs_to_file(&config, true));
        assert!(!logs_to_file(&config, false));

        config.logging.to_file = false;
        assert!(!logs_to_file(&config, true));
    }
}
