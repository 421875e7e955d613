// src/monitor/supervisor.rs

//! The supervisor loop: sole owner of the process tracker.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogStore, ScriptRecord};
use crate::errors::{Result, ScriptmonError};
use crate::exec::Launcher;
use crate::monitor::MonitorOptions;
use crate::monitor::events::OutputEvent;
use crate::tracker::{
    CapturedOutput, ProcessHandle, ProcessTracker, Reaped, TrackedProcess,
};

/// Requests accepted by the supervisor loop.
#[derive(Debug)]
pub enum SupervisorCommand {
    Start(ScriptRecord),
    Stop(ScriptRecord),
    /// Reply with the currently tracked paths.
    Snapshot(oneshot::Sender<Vec<PathBuf>>),
    /// Stop everything and end the loop. The sender fires once every stopped
    /// process has exited or been force-killed, and every pending finish
    /// report has been emitted.
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable front door to the supervisor task.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<SupervisorCommand>,
}

impl SupervisorHandle {
    pub async fn start(&self, script: ScriptRecord) -> Result<()> {
        self.send(SupervisorCommand::Start(script)).await
    }

    pub async fn stop(&self, script: ScriptRecord) -> Result<()> {
        self.send(SupervisorCommand::Stop(script)).await
    }

    pub async fn running_paths(&self) -> Result<Vec<PathBuf>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SupervisorCommand::Snapshot(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| ScriptmonError::ChannelClosed("supervisor snapshot reply"))
    }

    /// Ask the supervisor to stop all scripts and exit. Resolves once the
    /// stopped processes are gone, so the runtime can be dropped right after.
    pub async fn shutdown(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(SupervisorCommand::Shutdown(done_tx)).await?;
        done_rx
            .await
            .map_err(|_| ScriptmonError::ChannelClosed("supervisor shutdown ack"))
    }

    async fn send(&self, command: SupervisorCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ScriptmonError::ChannelClosed("supervisor command channel"))
    }
}

/// Spawn the supervisor loop.
///
/// Every lifecycle change is reported on `events`. The loop runs until it
/// receives [`SupervisorCommand::Shutdown`] or every [`SupervisorHandle`] is
/// dropped; in both cases remaining processes are stopped first.
pub fn spawn_supervisor<L: Launcher>(
    launcher: L,
    catalog: CatalogStore,
    options: MonitorOptions,
    events: mpsc::UnboundedSender<OutputEvent>,
) -> (SupervisorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<SupervisorCommand>(32);
    let (reports_tx, reports_rx) = mpsc::unbounded_channel();

    let supervisor = Supervisor {
        launcher,
        catalog,
        options,
        events,
        tracker: ProcessTracker::new(),
        finishing: HashMap::new(),
        reports_tx,
        escalations: JoinSet::new(),
    };
    let join = tokio::spawn(supervisor.run(rx, reports_rx));

    (SupervisorHandle { tx }, join)
}

struct Supervisor<L: Launcher> {
    launcher: L,
    catalog: CatalogStore,
    options: MonitorOptions,
    events: mpsc::UnboundedSender<OutputEvent>,
    tracker: ProcessTracker<L::Handle>,
    /// Paths whose finish report is still being assembled, with the start
    /// requests that arrived for them in the meantime.
    finishing: HashMap<PathBuf, Vec<ScriptRecord>>,
    reports_tx: mpsc::UnboundedSender<OutputEvent>,
    /// Stopped processes waiting out their grace period.
    escalations: JoinSet<()>,
}

impl<L: Launcher> Supervisor<L> {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<SupervisorCommand>,
        mut reports_rx: mpsc::UnboundedReceiver<OutputEvent>,
    ) {
        info!(
            poll_interval_ms = self.options.poll_interval.as_millis() as u64,
            "supervisor loop started"
        );

        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(SupervisorCommand::Shutdown(done)) => {
                        self.wind_down(&mut reports_rx).await;
                        let _ = done.send(());
                        break;
                    }
                    Some(SupervisorCommand::Start(script)) => self.start(script),
                    Some(SupervisorCommand::Stop(script)) => self.stop(script),
                    Some(SupervisorCommand::Snapshot(reply)) => {
                        let _ = reply.send(self.tracker.running_paths());
                    }
                    None => {
                        info!("supervisor command channel closed");
                        self.wind_down(&mut reports_rx).await;
                        break;
                    }
                },
                Some(report) = reports_rx.recv() => self.deliver_report(report),
                Some(joined) = self.escalations.join_next(), if !self.escalations.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "escalation task failed");
                    }
                }
                _ = ticker.tick() => self.reap_finished(),
            }
        }

        info!("supervisor loop finished");
    }

    fn start(&mut self, script: ScriptRecord) {
        if self.tracker.contains(&script.path) {
            debug!(path = %script.path.display(), "start ignored; already running");
            self.emit(OutputEvent::AlreadyRunning {
                title: script.title,
                path: script.path,
            });
            return;
        }

        // The previous run's report goes out first; start again after it.
        if let Some(waiting) = self.finishing.get_mut(&script.path) {
            debug!(path = %script.path.display(), "start deferred until finish report");
            waiting.push(script);
            return;
        }

        let handle = match self.launcher.launch(&script.path) {
            Ok(handle) => handle,
            Err(e) => {
                error!(path = %script.path.display(), error = %e, "failed to launch script");
                self.emit(OutputEvent::LaunchFailed {
                    title: script.title,
                    path: script.path,
                    error: e.to_string(),
                });
                return;
            }
        };

        let pid = handle.pid();
        let process = TrackedProcess::new(script.path.clone(), script.title.clone(), handle);
        if let Err(rejected) = self.tracker.insert(process) {
            // Cannot happen: `contains` was checked above and we are the only
            // writer. Don't leave an orphan behind if it ever does.
            let mut orphan = rejected.0;
            let _ = orphan.handle.force_kill();
            return;
        }

        self.emit(OutputEvent::Started {
            title: script.title,
            path: script.path,
            pid,
        });
    }

    fn stop(&mut self, script: ScriptRecord) {
        let Some(process) = self.tracker.remove(&script.path) else {
            debug!(path = %script.path.display(), "stop ignored; not running");
            self.emit(OutputEvent::NotRunning {
                title: script.title,
                path: script.path,
            });
            return;
        };

        let elapsed = self.terminate(process);
        self.emit(OutputEvent::Stopped {
            title: script.title,
            path: script.path,
            elapsed,
        });
    }

    /// Send the graceful terminate signal and hand the process to an
    /// escalation task. Returns the elapsed run time.
    fn terminate(&mut self, process: TrackedProcess<L::Handle>) -> Duration {
        let TrackedProcess {
            path,
            mut handle,
            started_at,
            ..
        } = process;

        if let Err(e) = handle.terminate() {
            warn!(path = %path.display(), error = %e, "failed to send terminate signal");
        }
        let elapsed = started_at.elapsed();
        info!(
            path = %path.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "stopped script process"
        );

        self.escalations.spawn(escalate_after_grace(
            handle,
            path,
            self.options.stop_grace,
            self.options.poll_interval,
        ));
        elapsed
    }

    fn stop_all(&mut self) {
        for process in self.tracker.drain() {
            let title = process.title.clone();
            let path = process.path.clone();
            let elapsed = self.terminate(process);
            self.emit(OutputEvent::Stopped {
                title,
                path,
                elapsed,
            });
        }
    }

    /// Stop every tracked process, then wait for them to exit (or be killed
    /// after the grace period) and for pending finish reports to go out.
    async fn wind_down(&mut self, reports_rx: &mut mpsc::UnboundedReceiver<OutputEvent>) {
        self.stop_all();
        for waiting in self.finishing.values_mut() {
            waiting.clear();
        }

        let limit = self.options.stop_grace + Duration::from_secs(1);
        let settle = async {
            while !self.finishing.is_empty() {
                match reports_rx.recv().await {
                    Some(report) => self.deliver_report(report),
                    None => break,
                }
            }
            while self.escalations.join_next().await.is_some() {}
        };
        if tokio::time::timeout(limit, settle).await.is_err() {
            warn!(
                limit_ms = limit.as_millis() as u64,
                "shutdown did not settle in time; remaining processes are killed"
            );
        }
    }

    /// Emit a finish report, then run any start that waited on it.
    fn deliver_report(&mut self, report: OutputEvent) {
        let deferred = self.finishing.remove(report.path()).unwrap_or_default();
        self.emit(report);
        for script in deferred {
            self.start(script);
        }
    }

    fn reap_finished(&mut self) {
        for reaped in self.tracker.reap_exited() {
            info!(
                path = %reaped.process.path.display(),
                exit_code = reaped.exit.code,
                elapsed_ms = reaped.elapsed.as_millis() as u64,
                "script process exited"
            );
            self.finishing
                .insert(reaped.process.path.clone(), Vec::new());
            tokio::spawn(report_finished(
                reaped,
                self.catalog.clone(),
                self.reports_tx.clone(),
            ));
        }
    }

    fn emit(&self, event: OutputEvent) {
        if self.events.send(event).is_err() {
            debug!("output event receiver dropped");
        }
    }
}

/// Drain output, resolve the catalog record, and hand exactly one
/// `Finished` event back to the loop for a reaped process.
async fn report_finished<H: ProcessHandle>(
    reaped: Reaped<H>,
    catalog: CatalogStore,
    reports: mpsc::UnboundedSender<OutputEvent>,
) {
    let Reaped {
        process,
        exit,
        elapsed,
    } = reaped;
    let path = process.path;

    let output = match process.handle.into_output().await {
        Ok(output) => output,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to collect process output");
            CapturedOutput::default()
        }
    };

    let title = lookup_title(&catalog, &path).await;

    let _ = reports.send(OutputEvent::Finished {
        title,
        path,
        elapsed,
        exit,
        output,
    });
}

async fn lookup_title(catalog: &CatalogStore, path: &Path) -> Option<String> {
    let catalog = catalog.clone();
    let owned = path.to_path_buf();
    match tokio::task::spawn_blocking(move || catalog.get_by_path(&owned)).await {
        Ok(Ok(Some(record))) => Some(record.title),
        Ok(Ok(None)) => {
            warn!(path = %path.display(), "finished process has no catalog record");
            None
        }
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "catalog lookup failed");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "catalog lookup task failed");
            None
        }
    }
}

/// Wait up to `grace` for a terminated process to exit, then force-kill it.
async fn escalate_after_grace<H: ProcessHandle>(
    mut handle: H,
    path: PathBuf,
    grace: Duration,
    poll: Duration,
) {
    let deadline = Instant::now() + grace;

    loop {
        match handle.try_exit() {
            Ok(Some(exit)) => {
                debug!(path = %path.display(), ?exit, "stopped process exited");
                return;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "exit check failed after terminate");
                break;
            }
        }

        if Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep(poll).await;
    }

    warn!(
        path = %path.display(),
        grace_ms = grace.as_millis() as u64,
        "process ignored terminate; force killing"
    );
    if let Err(e) = handle.force_kill() {
        error!(path = %path.display(), error = %e, "force kill failed");
    }
}
