// src/exec/process.rs

use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::MonitorSection;
use crate::errors::{Result, ScriptmonError};
use crate::exec::backend::Launcher;
use crate::tracker::{CapturedOutput, ExitSummary, OutputFuture, ProcessHandle};

/// Launches scripts through a configured interpreter.
#[derive(Debug, Clone)]
pub struct ScriptLauncher {
    interpreter: String,
    interpreter_args: Vec<String>,
}

impl ScriptLauncher {
    pub fn new(interpreter: impl Into<String>, interpreter_args: Vec<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            interpreter_args,
        }
    }

    pub fn from_config(monitor: &MonitorSection) -> Self {
        Self::new(monitor.interpreter.clone(), monitor.interpreter_args.clone())
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        cmd.args(&self.interpreter_args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Launcher for ScriptLauncher {
    type Handle = ChildHandle;

    fn launch(&self, path: &Path) -> Result<ChildHandle> {
        let mut child = self
            .command(path)
            .spawn()
            .map_err(|source| ScriptmonError::LaunchError {
                path: path.to_path_buf(),
                source,
            })?;

        info!(
            path = %path.display(),
            pid = child.id(),
            interpreter = %self.interpreter,
            "started script process"
        );

        // Drain both pipes from the start so a chatty child never blocks on a
        // full pipe before we notice it exited.
        let stdout = child.stdout.take().map(spawn_collector);
        let stderr = child.stderr.take().map(spawn_collector);

        Ok(ChildHandle {
            child,
            stdout,
            stderr,
        })
    }
}

fn spawn_collector<R>(stream: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut stream = stream;
        let mut buf = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buf).await {
            debug!(error = %e, "output stream read ended with error");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// A real child process with its stdout/stderr collectors.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
}

impl ProcessHandle for ChildHandle {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_exit(&mut self) -> Result<Option<ExitSummary>> {
        let status = self.child.try_wait()?;
        Ok(status.map(|s| ExitSummary {
            code: s.code(),
            success: s.success(),
        }))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        // No pid means the child has already been reaped.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid).context("pid out of range")?;
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(anyhow::Error::from(e)
                .context(format!("sending SIGTERM to pid {pid}"))
                .into()),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<()> {
        self.child.start_kill()?;
        Ok(())
    }

    fn force_kill(&mut self) -> Result<()> {
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // Already exited and reaped.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn into_output(self) -> OutputFuture {
        let ChildHandle {
            child,
            stdout,
            stderr,
        } = self;

        Box::pin(async move {
            let stdout = join_collector(stdout, "stdout").await?;
            let stderr = join_collector(stderr, "stderr").await?;
            drop(child);
            Ok(CapturedOutput { stdout, stderr })
        })
    }
}

async fn join_collector(handle: Option<JoinHandle<String>>, stream: &str) -> Result<String> {
    match handle {
        Some(handle) => handle.await.map_err(|e| {
            warn!(stream, error = %e, "output collector task failed");
            anyhow::Error::from(e)
                .context(format!("collecting {stream}"))
                .into()
        }),
        None => Ok(String::new()),
    }
}
