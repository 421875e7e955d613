// src/ui/runner.rs

use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::catalog::CatalogStore;
use crate::config::UiSection;
use crate::errors::{Result, ScriptmonError};
use crate::monitor::{OutputEvent, SupervisorHandle};
use crate::ui::actions::{apply_action, reload_scripts};
use crate::ui::app::App;
use crate::ui::render;
use crate::ui::terminal::{init_terminal, restore_terminal};

const REDRAW_INTERVAL: Duration = Duration::from_millis(150);

/// Run the interactive UI until the user quits, then stop every running
/// script through the supervisor.
pub async fn run_ui(
    catalog: CatalogStore,
    supervisor: SupervisorHandle,
    mut events: mpsc::UnboundedReceiver<OutputEvent>,
    ui: &UiSection,
) -> Result<()> {
    let mut app = App::new(ui.max_log_lines);
    reload_scripts(&mut app, &catalog);

    let mut terminal = init_terminal()?;
    let (key_tx, mut key_rx) = mpsc::channel::<KeyEvent>(64);
    spawn_input_listener(key_tx);

    let mut ticker = tokio::time::interval(REDRAW_INTERVAL);
    info!("ui started");

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| render::draw(frame, &app)) {
            break Err(e.into());
        }

        tokio::select! {
            key = key_rx.recv() => match key {
                Some(key) => {
                    let action = app.handle_key(key);
                    debug!(?action, "key action");
                    if let Err(e) = apply_action(&mut app, action, &catalog, &supervisor).await {
                        break Err(e);
                    }
                }
                None => {
                    warn!("terminal input closed; quitting");
                    app.input_closed();
                }
            },
            Some(event) = events.recv() => {
                app.apply_event(&event);
                // Fold in anything else already queued before redrawing.
                while let Ok(event) = events.try_recv() {
                    app.apply_event(&event);
                }
            }
            _ = ticker.tick() => {}
        }

        if app.should_quit() {
            break Ok(());
        }
    };

    restore_terminal(&mut terminal)?;

    match supervisor.shutdown().await {
        Ok(()) | Err(ScriptmonError::ChannelClosed(_)) => {}
        Err(e) => warn!(error = %e, "supervisor shutdown failed"),
    }
    info!("ui exited");
    result
}

/// Read terminal key events on a plain thread and forward them. The thread
/// ends once the receiver is gone.
fn spawn_input_listener(tx: mpsc::Sender<KeyEvent>) {
    std::thread::spawn(move || {
        loop {
            if tx.is_closed() {
                break;
            }
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if tx.blocking_send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "terminal read failed");
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "terminal poll failed");
                    break;
                }
            }
        }
    });
}
