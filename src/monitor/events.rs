// src/monitor/events.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::tracker::{CapturedOutput, ExitSummary};
use crate::types::format_elapsed;

/// Title used when a finished process cannot be matched to a catalog record.
pub const UNKNOWN_SCRIPT: &str = "<unknown script>";

/// Everything the supervisor reports back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Started {
        title: String,
        path: PathBuf,
        pid: Option<u32>,
    },
    /// Start requested for a path that already has a tracked process.
    AlreadyRunning { title: String, path: PathBuf },
    /// Stop requested for a path with no tracked process.
    NotRunning { title: String, path: PathBuf },
    LaunchFailed {
        title: String,
        path: PathBuf,
        error: String,
    },
    Stopped {
        title: String,
        path: PathBuf,
        elapsed: Duration,
    },
    /// The process exited on its own. `title` is `None` when the path no
    /// longer resolves to a catalog record.
    Finished {
        title: Option<String>,
        path: PathBuf,
        elapsed: Duration,
        exit: ExitSummary,
        output: CapturedOutput,
    },
}

impl OutputEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            OutputEvent::Started { path, .. }
            | OutputEvent::AlreadyRunning { path, .. }
            | OutputEvent::NotRunning { path, .. }
            | OutputEvent::LaunchFailed { path, .. }
            | OutputEvent::Stopped { path, .. }
            | OutputEvent::Finished { path, .. } => path,
        }
    }

    /// Whether a tracked process left the tracker with this event.
    pub fn ends_run(&self) -> bool {
        matches!(
            self,
            OutputEvent::Stopped { .. } | OutputEvent::Finished { .. }
        )
    }

    /// Text for a modal notice, if this event warrants one.
    pub fn notice(&self) -> Option<String> {
        match self {
            OutputEvent::AlreadyRunning { title, .. } => {
                Some(format!("Script '{title}' is already running."))
            }
            OutputEvent::NotRunning { title, .. } => {
                Some(format!("Script '{title}' is not running."))
            }
            OutputEvent::LaunchFailed { title, error, .. } => {
                Some(format!("Script '{title}' could not be started: {error}"))
            }
            _ => None,
        }
    }

    /// Lines appended to the output log.
    pub fn log_lines(&self) -> Vec<String> {
        match self {
            OutputEvent::Started { title, .. } => vec![format!("Started script: {title}")],
            OutputEvent::AlreadyRunning { .. } | OutputEvent::NotRunning { .. } => Vec::new(),
            OutputEvent::LaunchFailed { title, error, .. } => {
                vec![format!("Failed to start script: {title} ({error})")]
            }
            OutputEvent::Stopped { title, elapsed, .. } => vec![
                format!("Stopped script: {title}"),
                format!("Run time: {}", format_elapsed(*elapsed)),
                String::new(),
            ],
            OutputEvent::Finished {
                title,
                elapsed,
                exit,
                output,
                ..
            } => {
                let mut lines = vec![
                    format!(
                        "Script finished: {}",
                        title.as_deref().unwrap_or(UNKNOWN_SCRIPT)
                    ),
                    format!("Run time: {}", format_elapsed(*elapsed)),
                ];
                if !exit.success {
                    match exit.code {
                        Some(code) => lines.push(format!("Exit code: {code}")),
                        None => lines.push("Exit code: none (terminated by signal)".to_string()),
                    }
                }
                push_block(&mut lines, "Output", &output.stdout);
                push_block(&mut lines, "Error", &output.stderr);
                lines
            }
        }
    }
}

fn push_block(lines: &mut Vec<String>, label: &str, text: &str) {
    let text = text.trim_end();
    if text.is_empty() {
        return;
    }
    let mut iter = text.lines();
    if let Some(first) = iter.next() {
        lines.push(format!("{label}: {first}"));
    }
    lines.extend(iter.map(str::to_string));
}
