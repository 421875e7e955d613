// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ScriptmonError};

/// Accepted range for `[monitor].poll_interval_ms`.
pub const POLL_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=5000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ScriptmonError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.catalog, raw.monitor, raw.ui))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_catalog(cfg)?;
    validate_monitor(cfg)?;
    validate_ui(cfg)?;
    Ok(())
}

fn validate_catalog(cfg: &RawConfigFile) -> Result<()> {
    if cfg.catalog.database.as_os_str().is_empty() {
        return Err(ScriptmonError::ConfigError(
            "[catalog].database must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_monitor(cfg: &RawConfigFile) -> Result<()> {
    if cfg.monitor.interpreter.trim().is_empty() {
        return Err(ScriptmonError::ConfigError(
            "[monitor].interpreter must not be empty".to_string(),
        ));
    }

    if !POLL_INTERVAL_RANGE_MS.contains(&cfg.monitor.poll_interval_ms) {
        return Err(ScriptmonError::ConfigError(format!(
            "[monitor].poll_interval_ms must be within {}..={} (got {})",
            POLL_INTERVAL_RANGE_MS.start(),
            POLL_INTERVAL_RANGE_MS.end(),
            cfg.monitor.poll_interval_ms
        )));
    }

    Ok(())
}

fn validate_ui(cfg: &RawConfigFile) -> Result<()> {
    if cfg.ui.max_log_lines == 0 {
        return Err(ScriptmonError::ConfigError(
            "[ui].max_log_lines must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
