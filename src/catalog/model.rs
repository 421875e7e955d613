// src/catalog/model.rs

use std::path::{Path, PathBuf};

use crate::types::{ScriptId, Timestamp};

/// A registered script. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub title: String,
    pub description: String,
    pub path: PathBuf,
    pub date_added: Timestamp,
}

impl ScriptRecord {
    /// `"<id>: <title>"`, the form used in the script list.
    pub fn list_label(&self) -> String {
        format!("{}: {}", self.id, self.title)
    }

    /// Multi-line block shown when the record is selected.
    pub fn details(&self) -> Vec<String> {
        vec![
            format!("Selected script: {}", self.title),
            format!("Description: {}", self.description),
            format!("Path: {}", self.path.display()),
            format!("Date Added: {}", self.date_added),
            String::new(),
        ]
    }
}

/// Input for [`CatalogStore::insert`](super::CatalogStore::insert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScript {
    pub title: String,
    pub description: String,
    pub path: PathBuf,
    pub date_added: Timestamp,
}

impl NewScript {
    /// New entry stamped with the current time.
    pub fn now(
        title: impl Into<String>,
        description: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            path: path.as_ref().to_path_buf(),
            date_added: Timestamp::now(),
        }
    }
}
