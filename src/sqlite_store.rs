use crate::store::{KeyValueStore, StoreError};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;

/// SQLite-backed key-value store for persisted dashboard state.
///
/// Automatically creates its schema on first use.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a file-based store.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = SqliteStore { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates a store backed by an in-memory database.
    ///
    /// Useful for testing.
    pub fn new_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> SqliteResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn table_exists(&self, table_name: &str) -> SqliteResult<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
        stmt.exists([table_name])
    }

    /// When `key` was last written, as an RFC 3339 timestamp.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT updated_at FROM kv_store WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Backend(format!("SQL error: {}", e)))
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StoreError::Backend(format!("SQL error: {}", e)))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let updated_at = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, updated_at],
            )
            .map_err(|e| StoreError::Backend(format!("SQL error: {}", e)))?;
        tracing::debug!(key, bytes = value.len(), "Saved value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(|e| StoreError::Backend(format!("SQL error: {}", e)))?;
        Ok(())
    }
}
