// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptmonError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Catalog storage error: {0}")]
    StorageError(#[from] rusqlite::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Failed to launch {path:?}: {source}")]
    LaunchError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid timestamp in catalog: {0}")]
    InvalidTimestamp(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScriptmonError>;
