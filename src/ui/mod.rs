// src/ui/mod.rs

//! Terminal user interface.
//!
//! - [`app`] is the application state and key handling. It performs no IO,
//!   so it is unit-tested directly.
//! - [`actions`] carries out what the user asked for against the catalog and
//!   the supervisor.
//! - [`render`] draws an `App` with ratatui.
//! - [`terminal`] sets up and restores the crossterm terminal.
//! - [`runner`] is the event loop tying it all together.

pub mod actions;
pub mod app;
pub mod render;
pub mod runner;
pub mod terminal;

pub use app::{AddPrompt, App, AppAction, OutputLog, PromptStep};
pub use runner::run_ui;
