//! Connection setup for the SQLite backend.
//!
//! The local and session handles of one client usually share a database
//! file, so file connections run in WAL mode with a busy timeout. The
//! `kv_entries` table is created by embedded migrations tracked through
//! SQLite's `user_version`.

use std::time::Duration;

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::error::StorageError;

/// How long a handle waits for the other handle's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial_schema.sql"))])
}

/// Where a connection's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location<'a> {
    File(&'a str),
    Memory,
}

/// Opens a connection at `location` with the `kv_entries` schema in place.
pub(crate) fn connect(location: Location<'_>) -> Result<Connection, StorageError> {
    let mut conn = match location {
        Location::File(path) => {
            let conn = Connection::open(path)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn
        }
        Location::Memory => Connection::open_in_memory()?,
    };
    migrations()
        .to_latest(&mut conn)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn memory_connection_has_kv_table() {
        let conn = connect(Location::Memory).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv_entries'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(user_version(&conn), 1);
    }

    #[test]
    fn file_connection_is_wal_with_busy_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flora.db");
        let conn = connect(Location::File(path.to_str().unwrap())).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, BUSY_TIMEOUT.as_millis() as i64);
    }

    #[test]
    fn second_handle_on_a_file_finds_schema_current() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flora.db");
        let path = path.to_str().unwrap();

        let first = connect(Location::File(path)).unwrap();
        first
            .execute(
                "INSERT INTO kv_entries (namespace, key, value) VALUES ('local', 'cart', '[]')",
                [],
            )
            .unwrap();
        let second = connect(Location::File(path)).unwrap();
        assert_eq!(user_version(&second), 1);
        let rows: i64 = second
            .query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
