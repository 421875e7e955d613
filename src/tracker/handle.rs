// src/tracker/handle.rs

//! Abstraction over a running child process.
//!
//! The tracker and monitor only talk to [`ProcessHandle`]; production code
//! uses `exec::ChildHandle`, tests use a scripted fake.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

/// How a process ended, as far as the OS tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSummary {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl ExitSummary {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

/// Everything the process wrote to stdout and stderr, decoded lossily.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

pub type OutputFuture = Pin<Box<dyn Future<Output = Result<CapturedOutput>> + Send>>;

pub trait ProcessHandle: Send + 'static {
    fn pid(&self) -> Option<u32>;

    /// Non-blocking exit check.
    fn try_exit(&mut self) -> Result<Option<ExitSummary>>;

    /// Ask the process to exit (SIGTERM on unix).
    fn terminate(&mut self) -> Result<()>;

    /// Kill the process outright.
    fn force_kill(&mut self) -> Result<()>;

    /// Consume the handle and wait for both output streams to close.
    fn into_output(self) -> OutputFuture;
}
