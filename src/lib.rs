// src/lib.rs

pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod monitor;
pub mod tracker;
pub mod types;
pub mod ui;

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::catalog::{CatalogStore, NewScript};
use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_or_default};
use crate::exec::ScriptLauncher;
use crate::logging::LogTarget;
use crate::monitor::{MonitorOptions, OutputEvent, spawn_supervisor};
use crate::types::ScriptId;

/// Load config and apply CLI overrides.
pub fn resolve_config(args: &CliArgs) -> crate::errors::Result<ConfigFile> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    if let Some(db) = &args.database {
        cfg.catalog.database = db.clone();
    }
    if let Some(interpreter) = &args.interpreter {
        cfg.monitor.interpreter = interpreter.clone();
    }
    Ok(cfg)
}

/// Where logs should go for this invocation.
pub fn log_target(args: &CliArgs, cfg: &ConfigFile) -> LogTarget {
    match args.command() {
        Command::Ui => LogTarget::File(cfg.ui.log_file.clone()),
        _ => LogTarget::Stderr,
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the catalog store
/// - the launcher + supervisor loop
/// - the terminal UI or one of the non-interactive commands
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    let catalog = CatalogStore::open(&cfg.catalog.database)?;
    info!(database = %catalog.db_path().display(), "catalog opened");

    match args.command() {
        Command::Ui => run_interactive(catalog, &cfg).await,
        Command::Add {
            path,
            title,
            description,
        } => {
            let id = catalog.insert(&NewScript::now(title, description, &path))?;
            println!("{id}");
            Ok(())
        }
        Command::List => {
            for script in catalog.list_all()? {
                println!("{}", script.list_label());
            }
            Ok(())
        }
        Command::Show { id } => {
            let script = catalog.require(id)?;
            for line in script.details() {
                println!("{line}");
            }
            Ok(())
        }
        Command::Run { ids } => run_headless(catalog, &cfg, &ids).await,
    }
}

async fn run_interactive(catalog: CatalogStore, cfg: &ConfigFile) -> Result<()> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (supervisor, join) = spawn_supervisor(
        ScriptLauncher::from_config(&cfg.monitor),
        catalog.clone(),
        MonitorOptions::from_config(&cfg.monitor),
        events_tx,
    );

    ui::run_ui(catalog, supervisor, events_rx, &cfg.ui).await?;

    if let Err(e) = join.await {
        warn!(error = %e, "supervisor task ended abnormally");
    }
    Ok(())
}

/// Start the given scripts and stream their reports to stdout until every
/// one of them has finished. Ctrl-C stops whatever is still running.
async fn run_headless(catalog: CatalogStore, cfg: &ConfigFile, ids: &[ScriptId]) -> Result<()> {
    // Resolve everything first so a typo doesn't leave half the set running.
    let mut scripts = Vec::with_capacity(ids.len());
    for &id in ids {
        scripts.push(catalog.require(id)?);
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (supervisor, join) = spawn_supervisor(
        ScriptLauncher::from_config(&cfg.monitor),
        catalog,
        MonitorOptions::from_config(&cfg.monitor),
        events_tx,
    );

    let mut pending: HashSet<PathBuf> = HashSet::new();
    for script in scripts {
        pending.insert(script.path.clone());
        supervisor.start(script).await?;
    }

    let mut failed = false;
    let mut stdout = std::io::stdout();

    while !pending.is_empty() {
        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else { break };
                for line in event.log_lines() {
                    writeln!(stdout, "{line}")?;
                }
                if let Some(notice) = event.notice() {
                    eprintln!("{notice}");
                }
                match &event {
                    OutputEvent::LaunchFailed { path, .. } => {
                        failed = true;
                        pending.remove(path);
                    }
                    OutputEvent::Finished { path, exit, .. } => {
                        failed |= !exit.success;
                        pending.remove(path);
                    }
                    OutputEvent::Stopped { path, .. } => {
                        pending.remove(path);
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received; stopping scripts");
                supervisor.shutdown().await?;
                failed = true;
                // Print the Stopped reports queued by the shutdown.
                while let Ok(event) = events_rx.try_recv() {
                    for line in event.log_lines() {
                        writeln!(stdout, "{line}")?;
                    }
                }
                break;
            }
        }
    }

    drop(supervisor);
    if let Err(e) = join.await {
        warn!(error = %e, "supervisor task ended abnormally");
    }

    if failed {
        anyhow::bail!("one or more scripts failed or were stopped");
    }
    Ok(())
}
