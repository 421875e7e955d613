// src/catalog/store.rs

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::catalog::model::{NewScript, ScriptRecord};
use crate::errors::{Result, ScriptmonError};
use crate::types::{ScriptId, Timestamp};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS scripts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        path TEXT NOT NULL,
        date_added TEXT NOT NULL
    );
"#;

const SELECT_COLUMNS: &str = "SELECT id, title, description, path, date_added FROM scripts";

/// Handle to the script catalog file.
///
/// Holds only the database path; each call opens a fresh connection, so the
/// store is cheap to clone and safe to move into blocking tasks.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    db_path: PathBuf,
}

impl CatalogStore {
    /// Point the store at `db_path` and make sure the schema exists.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };
        store.connect()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    /// Append a record. Duplicate paths and titles are allowed.
    pub fn insert(&self, script: &NewScript) -> Result<ScriptId> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO scripts (title, description, path, date_added) VALUES (?1, ?2, ?3, ?4)",
            params![
                script.title,
                script.description,
                path_to_text(&script.path),
                script.date_added.to_string(),
            ],
        )?;
        let id = ScriptId(conn.last_insert_rowid());
        debug!(%id, path = %script.path.display(), "inserted script record");
        Ok(id)
    }

    /// Every record, in insertion order.
    pub fn list_all(&self) -> Result<Vec<ScriptRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;
        let rows = stmt.query_map([], RawRow::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_record()?);
        }
        Ok(out)
    }

    pub fn get_by_id(&self, id: ScriptId) -> Result<Option<ScriptRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.0],
                RawRow::from_row,
            )
            .optional()?;
        row.map(RawRow::into_record).transpose()
    }

    /// Look up a record by path. When several records share the path, the
    /// first inserted one wins.
    pub fn get_by_path(&self, path: &Path) -> Result<Option<ScriptRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE path = ?1 ORDER BY id ASC LIMIT 1"),
                params![path_to_text(path)],
                RawRow::from_row,
            )
            .optional()?;
        row.map(RawRow::into_record).transpose()
    }

    /// Like [`get_by_id`](Self::get_by_id) but absence is an error.
    pub fn require(&self, id: ScriptId) -> Result<ScriptRecord> {
        self.get_by_id(id)?
            .ok_or_else(|| ScriptmonError::ScriptNotFound(format!("no script with id {id}")))
    }
}

fn path_to_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Row as stored; the timestamp is parsed outside the rusqlite closure so a
/// bad value surfaces as `InvalidTimestamp`.
struct RawRow {
    id: i64,
    title: String,
    description: String,
    path: String,
    date_added: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            path: row.get(3)?,
            date_added: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<ScriptRecord> {
        Ok(ScriptRecord {
            id: ScriptId(self.id),
            title: self.title,
            description: self.description,
            path: PathBuf::from(self.path),
            date_added: Timestamp::parse(&self.date_added)?,
        })
    }
}
