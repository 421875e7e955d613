use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use scriptmon::errors::{Result, ScriptmonError};
use scriptmon::exec::Launcher;
use scriptmon::tracker::{CapturedOutput, ExitSummary, OutputFuture, ProcessHandle};

/// Observable state of one fake process.
#[derive(Debug, Clone, Default)]
pub struct FakeProcess {
    pub exit: Option<ExitSummary>,
    pub output: CapturedOutput,
    pub terminated: bool,
    pub killed: bool,
    ignores_terminate: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    processes: HashMap<PathBuf, Vec<Arc<Mutex<FakeProcess>>>>,
    failing: HashSet<PathBuf>,
    launches: Vec<PathBuf>,
    ignore_terminate: bool,
    next_pid: u32,
}

/// A launcher that never spawns OS processes:
/// - records every launch
/// - lets the test decide when (and how) each process exits
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later launch of `path` fail.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.failing.insert(path.as_ref().to_path_buf());
    }

    /// Processes launched from now on ignore the terminate signal.
    pub fn ignore_terminate(&self, ignore: bool) {
        self.state.lock().unwrap().ignore_terminate = ignore;
    }

    pub fn launches(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().launches.clone()
    }

    /// Let the most recent process for `path` exit with `code`.
    pub fn finish(&self, path: impl AsRef<Path>, code: i32, stdout: &str, stderr: &str) {
        let process = self.latest_handle(path.as_ref());
        let mut process = process.lock().unwrap();
        process.exit = Some(ExitSummary::from_code(code));
        process.output = CapturedOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        };
    }

    /// Snapshot of the most recent process for `path`.
    pub fn latest(&self, path: impl AsRef<Path>) -> FakeProcess {
        self.latest_handle(path.as_ref()).lock().unwrap().clone()
    }

    fn latest_handle(&self, path: &Path) -> Arc<Mutex<FakeProcess>> {
        let state = self.state.lock().unwrap();
        state
            .processes
            .get(path)
            .and_then(|list| list.last())
            .cloned()
            .unwrap_or_else(|| panic!("no fake process launched for {}", path.display()))
    }
}

impl Launcher for FakeLauncher {
    type Handle = FakeHandle;

    fn launch(&self, path: &Path) -> Result<FakeHandle> {
        let mut state = self.state.lock().unwrap();
        state.launches.push(path.to_path_buf());

        if state.failing.contains(path) {
            return Err(ScriptmonError::LaunchError {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake launch failure"),
            });
        }

        state.next_pid += 1;
        let pid = state.next_pid;
        let process = Arc::new(Mutex::new(FakeProcess {
            ignores_terminate: state.ignore_terminate,
            ..FakeProcess::default()
        }));
        state
            .processes
            .entry(path.to_path_buf())
            .or_default()
            .push(Arc::clone(&process));

        Ok(FakeHandle { pid, process })
    }
}

#[derive(Debug)]
pub struct FakeHandle {
    pid: u32,
    process: Arc<Mutex<FakeProcess>>,
}

impl ProcessHandle for FakeHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_exit(&mut self) -> Result<Option<ExitSummary>> {
        Ok(self.process.lock().unwrap().exit)
    }

    fn terminate(&mut self) -> Result<()> {
        let mut process = self.process.lock().unwrap();
        process.terminated = true;
        if !process.ignores_terminate && process.exit.is_none() {
            process.exit = Some(ExitSummary {
                code: None,
                success: false,
            });
        }
        Ok(())
    }

    fn force_kill(&mut self) -> Result<()> {
        let mut process = self.process.lock().unwrap();
        process.killed = true;
        if process.exit.is_none() {
            process.exit = Some(ExitSummary {
                code: None,
                success: false,
            });
        }
        Ok(())
    }

    fn into_output(self) -> OutputFuture {
        let output = self.process.lock().unwrap().output.clone();
        Box::pin(async move { Ok(output) })
    }
}
