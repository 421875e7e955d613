// src/ui/actions.rs

//! Carry out `AppAction`s against the catalog and the supervisor.
//!
//! Catalog failures never end the UI: they are logged and shown as a notice.
//! Only a dead supervisor is reported back to the caller.

use tracing::{info, warn};

use crate::catalog::{CatalogStore, NewScript, ScriptRecord};
use crate::errors::Result;
use crate::monitor::SupervisorHandle;
use crate::types::ScriptId;
use crate::ui::app::{App, AppAction};

pub async fn apply_action(
    app: &mut App,
    action: AppAction,
    catalog: &CatalogStore,
    supervisor: &SupervisorHandle,
) -> Result<()> {
    match action {
        AppAction::None | AppAction::Quit => {}
        AppAction::ShowSelection(ids) => {
            let records = fetch_records(app, catalog, &ids);
            app.render_selection(&records);
        }
        AppAction::AddScript {
            path,
            title,
            description,
        } => {
            if !path.is_file() {
                app.show_notice(format!("File not found: {}", path.display()));
                return Ok(());
            }
            // Starts and finish lookups key on the stored path, so it must
            // not depend on the current directory.
            let path = match std::fs::canonicalize(&path) {
                Ok(path) => path,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to resolve script path");
                    app.show_notice(format!("Could not resolve {}: {e}", path.display()));
                    return Ok(());
                }
            };
            match catalog.insert(&NewScript::now(title, description, &path)) {
                Ok(id) => {
                    info!(%id, path = %path.display(), "script added");
                    reload_scripts(app, catalog);
                }
                Err(e) => {
                    warn!(error = %e, "failed to add script");
                    app.show_notice(format!("Could not add script: {e}"));
                }
            }
        }
        AppAction::Start(ids) => {
            for record in fetch_records(app, catalog, &ids) {
                supervisor.start(record).await?;
            }
        }
        AppAction::Stop(ids) => {
            for record in fetch_records(app, catalog, &ids) {
                supervisor.stop(record).await?;
            }
        }
    }
    Ok(())
}

/// Refresh the list from the catalog.
pub fn reload_scripts(app: &mut App, catalog: &CatalogStore) {
    match catalog.list_all() {
        Ok(scripts) => app.set_scripts(scripts),
        Err(e) => {
            warn!(error = %e, "failed to load scripts");
            app.show_notice(format!("Could not load scripts: {e}"));
        }
    }
}

/// Resolve ids to records, skipping (and reporting) any that are missing.
fn fetch_records(app: &mut App, catalog: &CatalogStore, ids: &[ScriptId]) -> Vec<ScriptRecord> {
    let mut records = Vec::with_capacity(ids.len());
    let mut problems = Vec::new();

    for &id in ids {
        match catalog.get_by_id(id) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => problems.push(format!("Script {id} no longer exists.")),
            Err(e) => {
                warn!(%id, error = %e, "catalog lookup failed");
                problems.push(format!("Could not read script {id}: {e}"));
            }
        }
    }

    if !problems.is_empty() {
        app.show_notice(problems.join("\n"));
    }
    records
}
