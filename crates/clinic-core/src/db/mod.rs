//! Database layer for the clinic store.
//!
//! `Database` is the only writer of persisted state. Every mutation goes
//! through [`Database::write`], which scopes it in a transaction that commits
//! when the closure succeeds and rolls back on every other exit path.

mod schema;
mod records;
mod patients;
mod statuses;
mod soaps;
mod triages;
mod drug_updates;
mod settings;

pub use schema::*;
pub use records::*;
#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use statuses::*;
#[allow(unused_imports)]
pub use settings::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::config::StoreConfig;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Open the database described by `config`.
    pub fn open_with_config(config: &StoreConfig) -> DbResult<Self> {
        let conn = Connection::open(&config.database_path)?;
        conn.busy_timeout(config.busy_timeout())?;
        let db = Self { conn };
        db.initialize()?;
        tracing::debug!(path = %config.database_path.display(), "opened clinic store");
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for reads and advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`. On error, or if `f`
    /// panics, it is dropped and rolled back.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(DbError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}
