// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually launching registered scripts,
//! using `tokio::process::Command`, and exposing each child through the
//! tracker's [`ProcessHandle`](crate::tracker::ProcessHandle) trait.
//!
//! - [`backend`] provides the `Launcher` trait the monitor uses, so tests can
//!   swap in a fake launcher that never spawns OS processes.
//! - [`process`] holds the production `ScriptLauncher` and `ChildHandle`.

pub mod backend;
pub mod process;

pub use backend::Launcher;
pub use process::{ChildHandle, ScriptLauncher};
