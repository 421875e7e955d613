// src/tracker/mod.rs

//! In-memory record of currently running scripts.
//!
//! `ProcessTracker` is plain synchronous state with no channels or Tokio
//! types. It is owned by exactly one task (the monitor's supervisor loop), so
//! no locking is needed; every other actor talks to it through
//! `monitor::SupervisorCommand`s.

pub mod handle;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

pub use handle::{CapturedOutput, ExitSummary, OutputFuture, ProcessHandle};

use crate::types::Timestamp;

/// A running script, keyed by its path in the tracker.
#[derive(Debug)]
pub struct TrackedProcess<H> {
    pub path: PathBuf,
    pub title: String,
    pub handle: H,
    pub started_at: Instant,
    pub started_wall: Timestamp,
}

impl<H> TrackedProcess<H> {
    pub fn new(path: PathBuf, title: String, handle: H) -> Self {
        Self {
            path,
            title,
            handle,
            started_at: Instant::now(),
            started_wall: Timestamp::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Returned by [`ProcessTracker::insert`] when the path already has an entry.
/// Carries the rejected process back so the caller can dispose of it.
#[derive(Debug)]
pub struct AlreadyRunning<H>(pub TrackedProcess<H>);

/// An entry removed by [`ProcessTracker::reap_exited`].
#[derive(Debug)]
pub struct Reaped<H> {
    pub process: TrackedProcess<H>,
    pub exit: ExitSummary,
    pub elapsed: Duration,
}

/// At most one [`TrackedProcess`] per path.
#[derive(Debug)]
pub struct ProcessTracker<H> {
    running: HashMap<PathBuf, TrackedProcess<H>>,
}

impl<H> Default for ProcessTracker<H> {
    fn default() -> Self {
        Self {
            running: HashMap::new(),
        }
    }
}

impl<H: ProcessHandle> ProcessTracker<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.running.contains_key(path)
    }

    /// Sorted for stable output.
    pub fn running_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.running.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn insert(
        &mut self,
        process: TrackedProcess<H>,
    ) -> std::result::Result<(), AlreadyRunning<H>> {
        if self.running.contains_key(&process.path) {
            return Err(AlreadyRunning(process));
        }
        self.running.insert(process.path.clone(), process);
        Ok(())
    }

    pub fn remove(&mut self, path: &Path) -> Option<TrackedProcess<H>> {
        self.running.remove(path)
    }

    /// Remove and return every entry whose process has exited.
    ///
    /// An entry whose exit check itself fails is treated as exited with an
    /// unknown status, so a broken handle cannot stay tracked forever.
    pub fn reap_exited(&mut self) -> Vec<Reaped<H>> {
        let mut exited = Vec::new();

        for (path, process) in self.running.iter_mut() {
            match process.handle.try_exit() {
                Ok(Some(summary)) => exited.push((path.clone(), summary)),
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "exit check failed; dropping entry");
                    exited.push((
                        path.clone(),
                        ExitSummary {
                            code: None,
                            success: false,
                        },
                    ));
                }
            }
        }

        let mut reaped = Vec::with_capacity(exited.len());
        for (path, exit) in exited {
            if let Some(process) = self.running.remove(&path) {
                let elapsed = process.elapsed();
                debug!(path = %path.display(), ?exit, elapsed_ms = elapsed.as_millis() as u64, "reaped exited process");
                reaped.push(Reaped {
                    process,
                    exit,
                    elapsed,
                });
            }
        }
        reaped.sort_by(|a, b| a.process.path.cmp(&b.process.path));
        reaped
    }

    /// Empty the tracker, e.g. on shutdown.
    pub fn drain(&mut self) -> Vec<TrackedProcess<H>> {
        self.running.drain().map(|(_, p)| p).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Result, ScriptmonError};

    /// Minimal in-module handle: exits once `exit_after` polls have happened.
    #[derive(Debug)]
    struct CountdownHandle {
        polls_left: u32,
        code: i32,
        broken: bool,
    }

    impl CountdownHandle {
        fn running() -> Self {
            Self { polls_left: u32::MAX, code: 0, broken: false }
        }

        fn exits_after(polls: u32, code: i32) -> Self {
            Self { polls_left: polls, code, broken: false }
        }
    }

    impl ProcessHandle for CountdownHandle {
        fn pid(&self) -> Option<u32> {
            None
        }

        fn try_exit(&mut self) -> Result<Option<ExitSummary>> {
            if self.broken {
                return Err(ScriptmonError::ChannelClosed("broken handle"));
            }
            if self.polls_left == 0 {
                return Ok(Some(ExitSummary::from_code(self.code)));
            }
            self.polls_left -= 1;
            Ok(None)
        }

        fn terminate(&mut self) -> Result<()> {
            Ok(())
        }

        fn force_kill(&mut self) -> Result<()> {
            Ok(())
        }

        fn into_output(self) -> OutputFuture {
            Box::pin(async { Ok(CapturedOutput::default()) })
        }
    }

    fn tracked(path: &str, handle: CountdownHandle) -> TrackedProcess<CountdownHandle> {
        TrackedProcess::new(PathBuf::from(path), path.to_string(), handle)
    }

    #[test]
    fn second_insert_for_same_path_is_rejected() {
        let mut tracker = ProcessTracker::new();
        tracker.insert(tracked("/a.py", CountdownHandle::running())).unwrap();

        let rejected = tracker
            .insert(tracked("/a.py", CountdownHandle::running()))
            .unwrap_err();
        assert_eq!(rejected.0.path, PathBuf::from("/a.py"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn remove_missing_path_changes_nothing() {
        let mut tracker = ProcessTracker::new();
        tracker.insert(tracked("/a.py", CountdownHandle::running())).unwrap();

        assert!(tracker.remove(Path::new("/b.py")).is_none());
        assert_eq!(tracker.running_paths(), vec![PathBuf::from("/a.py")]);
    }

    #[test]
    fn reap_removes_exited_entries_exactly_once() {
        let mut tracker = ProcessTracker::new();
        tracker.insert(tracked("/done.py", CountdownHandle::exits_after(1, 3))).unwrap();
        tracker.insert(tracked("/busy.py", CountdownHandle::running())).unwrap();

        assert!(tracker.reap_exited().is_empty());

        let reaped = tracker.reap_exited();
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].process.path, PathBuf::from("/done.py"));
        assert_eq!(reaped[0].exit.code, Some(3));
        assert!(!reaped[0].exit.success);

        assert!(tracker.reap_exited().is_empty());
        assert!(!tracker.contains(Path::new("/done.py")));
        assert!(tracker.contains(Path::new("/busy.py")));
    }

    #[test]
    fn broken_handle_is_reaped_with_unknown_status() {
        let mut tracker = ProcessTracker::new();
        let mut handle = CountdownHandle::running();
        handle.broken = true;
        tracker.insert(tracked("/x.py", handle)).unwrap();

        let reaped = tracker.reap_exited();
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].exit.code, None);
        assert!(tracker.is_empty());
    }
}
