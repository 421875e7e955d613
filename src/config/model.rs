// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [catalog]
/// database = "scripts.db"
///
/// [monitor]
/// interpreter = "python3"
/// interpreter_args = ["-u"]
/// poll_interval_ms = 250
/// stop_grace_ms = 3000
///
/// [ui]
/// log_file = "scriptmon.log"
/// max_log_lines = 5000
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub ui: UiSection,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    /// SQLite file holding the `scripts` table.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from("scripts.db")
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

/// `[monitor]` section: how scripts are launched and watched.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Interpreter binary; the script path is passed as its last argument.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Extra arguments placed between the interpreter and the script path.
    #[serde(default)]
    pub interpreter_args: Vec<String>,

    /// How often the monitor checks tracked processes for exit.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a stopped process gets after the terminate signal before it
    /// is force-killed.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_stop_grace_ms() -> u64 {
    3000
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            interpreter_args: Vec::new(),
            poll_interval_ms: default_poll_interval_ms(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

impl MonitorSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// `[ui]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UiSection {
    /// Where tracing output goes while the terminal UI owns the screen.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Output pane keeps at most this many lines.
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("scriptmon.log")
}

fn default_max_log_lines() -> usize {
    5000
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            max_log_lines: default_max_log_lines(),
        }
    }
}

/// Validated configuration. Only constructible through
/// `ConfigFile::try_from(RawConfigFile)` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub catalog: CatalogSection,
    pub monitor: MonitorSection,
    pub ui: UiSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        catalog: CatalogSection,
        monitor: MonitorSection,
        ui: UiSection,
    ) -> Self {
        Self {
            catalog,
            monitor,
            ui,
        }
    }
}
