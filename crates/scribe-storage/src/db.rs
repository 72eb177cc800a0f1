//! SQLite connection handle shared by the transcript store and user directory.
//!
//! One `rusqlite::Connection` behind a `Mutex`; every statement runs under
//! that lock. Migrations run when the handle is opened.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use scribe_core::error::ScribeError;

use crate::migrations;

const FILE_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
                            PRAGMA synchronous = NORMAL;
                            PRAGMA foreign_keys = ON;";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file, creating parent directories.
    pub fn new(path: &Path) -> Result<Self, ScribeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| {
            ScribeError::Storage(format!("Cannot open {}: {}", path.display(), e))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| ScribeError::Storage(format!("Cannot set busy timeout: {}", e)))?;

        let db = Self::prepare(conn, FILE_PRAGMAS)?;
        info!(path = %path.display(), "Transcript database ready");
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    pub fn in_memory() -> Result<Self, ScribeError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ScribeError::Storage(format!("Cannot open in-memory database: {}", e)))?;
        Self::prepare(conn, "PRAGMA foreign_keys = ON;")
    }

    fn prepare(conn: Connection, pragmas: &str) -> Result<Self, ScribeError> {
        conn.execute_batch(pragmas)
            .map_err(|e| ScribeError::Storage(format!("Cannot apply pragmas: {}", e)))?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Run `f` with the connection locked.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ScribeError>
    where
        F: FnOnce(&Connection) -> Result<T, ScribeError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ScribeError::Storage("Database lock poisoned".to_string()))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
