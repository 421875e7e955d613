// src/logging.rs

//! Logging setup for `scriptmon` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SCRIPTMON_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Non-interactive commands log to STDERR so stdout stays clean for script
//! output. The terminal UI owns the screen, so while it runs logs are
//! appended to a file instead.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Where log lines are written.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, target: LogTarget) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var("SCRIPTMON_LOG").ok().as_deref());

    match target {
        LogTarget::Stderr => {
            fmt()
                .with_max_level(level)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogTarget::File(path) => {
            let file = open_log_file(&path)?;
            fmt()
                .with_max_level(level)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_beats_env() {
        assert_eq!(
            resolve_level(Some(LogLevel::Trace), Some("error")),
            tracing::Level::TRACE
        );
    }

    #[test]
    fn env_is_used_when_flag_absent() {
        assert_eq!(resolve_level(None, Some(" Warning ")), tracing::Level::WARN);
    }

    #[test]
    fn unknown_env_falls_back_to_info() {
        assert_eq!(resolve_level(None, Some("loud")), tracing::Level::INFO);
        assert_eq!(resolve_level(None, None), tracing::Level::INFO);
    }
}
