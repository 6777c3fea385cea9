#![forbid(unsafe_code)]

mod error;
mod items;
mod purchases;
mod support;

pub use error::StoreError;

use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use support::migrate_sqlite_schema;

pub const DB_FILE_NAME: &str = "kitchen_board.db";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the board database under `storage_dir` and
    /// brings its schema up to date.
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        migrate_sqlite_schema(&conn)?;
        tracing::info!(path = %db_path.display(), "board database opened");

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn schema_version(&self) -> Result<Option<String>, StoreError> {
        let version = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params!["schema_version"],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(version)
    }
}

/// Matches both SELECT ("no such column") and INSERT ("has no column named")
/// failures against an older table shape.
fn is_missing_column(err: &rusqlite::Error) -> bool {
    let message = err.to_string();
    message.contains("no such column") || message.contains("has no column named")
}
