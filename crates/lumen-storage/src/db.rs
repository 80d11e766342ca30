//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use lumen_core::error::LumenError;

use crate::migrations;

/// Location string that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Thread-safe SQLite database wrapper.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file and run pending migrations.
    pub fn new(path: &Path) -> Result<Self, LumenError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| LumenError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| LumenError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());
        Self::with_migrations(conn)
    }

    /// Open an in-memory database.
    pub fn in_memory() -> Result<Self, LumenError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LumenError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::with_migrations(conn)
    }

    /// Open by configured location: `:memory:` or a file path.
    pub fn open(location: &str) -> Result<Self, LumenError> {
        if location == IN_MEMORY {
            Self::in_memory()
        } else {
            Self::new(Path::new(location))
        }
    }

    fn with_migrations(conn: Connection) -> Result<Self, LumenError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with the underlying connection. The mutex is held
    /// for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, LumenError>
    where
        F: FnOnce(&Connection) -> Result<T, LumenError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LumenError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Number of rows in the orders table.
    pub fn order_count(&self) -> Result<i64, LumenError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
                .map_err(|e| LumenError::Storage(e.to_string()))
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
