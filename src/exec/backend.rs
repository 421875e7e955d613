// src/exec/backend.rs

//! Pluggable launcher abstraction.
//!
//! The monitor talks to a `Launcher` instead of spawning processes itself.
//!
//! - `ScriptLauncher` is the default implementation used by `scriptmon`. It
//!   runs `<interpreter> [args...] <script path>`.
//! - Tests can provide their own `Launcher` that hands out scripted handles
//!   and lets the test decide when each "process" exits.

use std::path::Path;

use crate::errors::Result;
use crate::tracker::ProcessHandle;

/// Trait abstracting how a script path becomes a running process.
pub trait Launcher: Send + Sync + 'static {
    type Handle: ProcessHandle;

    /// Start the script at `path`. Must not block on the child.
    fn launch(&self, path: &Path) -> Result<Self::Handle>;
}
