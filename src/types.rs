// src/types.rs

//! Small value types shared by the catalog, tracker and output log.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::errors::ScriptmonError;

/// Row id of a catalog entry. Assigned by SQLite, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptId(pub i64);

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScriptId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ScriptId)
            .map_err(|_| format!("invalid script id: {s:?}"))
    }
}

/// Wall-clock timestamp with second precision, stored in the catalog as
/// `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(PrimitiveDateTime);

impl Timestamp {
    /// Current local time; falls back to UTC when the local offset cannot be
    /// determined (e.g. multi-threaded process on some unix platforms).
    pub fn now() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let now = now.replace_nanosecond(0).unwrap_or(now);
        Timestamp(PrimitiveDateTime::new(now.date(), now.time()))
    }

    pub fn parse(s: &str) -> Result<Self, ScriptmonError> {
        PrimitiveDateTime::parse(s.trim(), STORAGE_FORMAT)
            .map(Timestamp)
            .map_err(|e| ScriptmonError::InvalidTimestamp(format!("{s:?}: {e}")))
    }
}

const STORAGE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(STORAGE_FORMAT) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Render an elapsed run time as `H:MM:SS.mmm`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours}:{mins:02}:{secs:02}.{ms:03}")
}
