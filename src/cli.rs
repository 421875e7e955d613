// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::ScriptId;

/// Command-line arguments for `scriptmon`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptmon",
    version,
    about = "Register scripts, launch them, and watch them finish.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Scriptmon.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Catalog database file; overrides `[catalog].database`.
    #[arg(long, value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Interpreter used to run scripts; overrides `[monitor].interpreter`.
    #[arg(long, value_name = "BIN", global = true)]
    pub interpreter: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTMON_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The subcommand to run; the interactive UI when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Ui)
    }
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Interactive terminal UI (default).
    Ui,
    /// Register a script in the catalog.
    Add {
        /// Script file to register.
        path: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List registered scripts as `id: title`.
    List,
    /// Show the details of one script.
    Show { id: ScriptId },
    /// Start scripts and print their reports until all have finished.
    Run {
        #[arg(required = true)]
        ids: Vec<ScriptId>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_ui() {
        let args = CliArgs::try_parse_from(["scriptmon"]).unwrap();
        assert_eq!(args.command(), Command::Ui);
    }

    #[test]
    fn add_parses_title_and_description() {
        let args = CliArgs::try_parse_from([
            "scriptmon",
            "add",
            "/tmp/sleep.py",
            "--title",
            "Ping",
            "--description",
            "sleeps",
        ])
        .unwrap();
        assert_eq!(
            args.command(),
            Command::Add {
                path: PathBuf::from("/tmp/sleep.py"),
                title: "Ping".into(),
                description: "sleeps".into(),
            }
        );
    }

    #[test]
    fn run_requires_ids_and_accepts_global_flags_after_subcommand() {
        assert!(CliArgs::try_parse_from(["scriptmon", "run"]).is_err());

        let args = CliArgs::try_parse_from(["scriptmon", "run", "1", "2", "--interpreter", "sh"])
            .unwrap();
        assert_eq!(args.interpreter.as_deref(), Some("sh"));
        assert_eq!(
            args.command(),
            Command::Run {
                ids: vec![ScriptId(1), ScriptId(2)]
            }
        );
    }
}
