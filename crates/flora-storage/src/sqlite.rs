//! SQLite implementation of [`KeyValueStore`].
//!
//! [`SqliteStore`] keeps every namespace in a single `kv_entries` table. A
//! handle is bound to one [`Namespace`]; open a second handle on the same
//! file for the other scope.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::schema::{connect, Location};
use crate::traits::KeyValueStore;
use crate::types::Namespace;

/// SQLite-backed implementation of [`KeyValueStore`].
pub struct SqliteStore {
    conn: Connection,
    namespace: Namespace,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`, scoped to `namespace`.
    pub fn new(path: &str, namespace: Namespace) -> Result<Self, StorageError> {
        let conn = connect(Location::File(path))?;
        Ok(SqliteStore { conn, namespace })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory(namespace: Namespace) -> Result<Self, StorageError> {
        let conn = connect(Location::Memory)?;
        Ok(SqliteStore { conn, namespace })
    }

    /// The namespace this handle reads and writes.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![self.namespace.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv_entries (namespace, key, value, updated_at)
             VALUES (?1, ?2, ?3, strftime('%s', 'now'))
             ON CONFLICT (namespace, key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.namespace.as_str(), key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM kv_entries WHERE namespace = ?1 AND key = ?2",
            params![self.namespace.as_str(), key],
        )?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT key FROM kv_entries WHERE namespace = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![self.namespace.as_str()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM kv_entries WHERE namespace = ?1",
            params![self.namespace.as_str()],
        )?;
        Ok(())
    }
}
