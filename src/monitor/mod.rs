// src/monitor/mod.rs

//! Background monitor for launched scripts.
//!
//! A single supervisor task owns the [`ProcessTracker`](crate::tracker::ProcessTracker).
//! Everything else talks to it over a channel:
//!
//! - UI actions (or the headless `run` command) send [`SupervisorCommand`]s
//!   through a [`SupervisorHandle`].
//! - The supervisor polls tracked processes on a fixed interval, reaps the
//!   ones that exited, and reports every lifecycle change as an
//!   [`OutputEvent`].
//!
//! Draining a finished process's output and resolving its catalog record run
//! in detached tasks, so a slow reader never stalls the poll loop. Their
//! reports come back through the loop, which holds any restart of the same
//! path until the previous run's report is out.

pub mod events;
pub mod supervisor;

use std::time::Duration;

use crate::config::MonitorSection;

pub use events::OutputEvent;
pub use supervisor::{SupervisorCommand, SupervisorHandle, spawn_supervisor};

/// Timing knobs for the supervisor loop.
#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
    pub stop_grace: Duration,
}

impl MonitorOptions {
    pub fn from_config(monitor: &MonitorSection) -> Self {
        Self {
            poll_interval: monitor.poll_interval(),
            stop_grace: monitor.stop_grace(),
        }
    }
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::from_config(&MonitorSection::default())
    }
}
