//! Repository layer for SQLite persistence.
//!
//! The metadata store holds document lifecycle records and per-page
//! text records. Access is split into:
//! - `documents`: point lookup, forward-only status updates, and the
//!   status-filtered scan the query path runs on
//! - `pages`: idempotent page writes and ordered range reads with a
//!   continuation key

mod documents;
mod pages;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub type Result<T> = std::result::Result<T, rusqlite::Error>;

/// SQLite-backed metadata store.
pub struct Repository {
    db_path: PathBuf,
}

impl Repository {
    /// Open (or create) the database and initialize the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    /// Open a connection with proper concurrency settings.
    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 30000;
        "#,
        )?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                status TEXT NOT NULL,
                ocr_job_ref TEXT,
                file_location TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);

            CREATE TABLE IF NOT EXISTS pages (
                document_id TEXT NOT NULL REFERENCES documents(id),
                page_number INTEGER NOT NULL,
                text TEXT NOT NULL,
                confidence REAL NOT NULL,
                file_location TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (document_id, page_number)
            );
        "#,
        )?;
        Ok(())
    }

    /// Get the database path.
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }
}

/// Parse a datetime string from the database, defaulting to Unix epoch
/// on error.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
