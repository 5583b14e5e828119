//! Database Connection and Setup
//!
//! Opens the local SQLite file backing the snapshot store and runs migrations.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::domain::{DomainError, DomainResult};

/// Open (or create) the database at `db_path`; `:memory:` is accepted
pub fn open_db(db_path: &Path) -> DomainResult<Connection> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Persistence(format!("Failed to open db: {}", e)))?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| DomainError::Persistence(e.to_string()))?;
    Ok(())
}

/// Read the blob stored under `key`
pub fn read_blob(conn: &Connection, key: &str) -> DomainResult<Option<String>> {
    conn.query_row(
        "SELECT value FROM snapshots WHERE key = ?",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(|e| DomainError::Persistence(e.to_string()))
}

/// Insert or replace the blob stored under `key`
pub fn write_blob(conn: &Connection, key: &str, value: &str) -> DomainResult<()> {
    let now = chrono::Local::now().timestamp_millis();
    conn.execute(
        "INSERT INTO snapshots (key, value, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )
    .map_err(|e| DomainError::Persistence(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_roundtrip_and_overwrite() {
        let conn = open_db(Path::new(":memory:")).expect("Failed to open test DB");
        assert_eq!(read_blob(&conn, "k").unwrap(), None);

        write_blob(&conn, "k", "[1]").unwrap();
        write_blob(&conn, "k", "[2]").unwrap();
        assert_eq!(read_blob(&conn, "k").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skate.db");
        {
            let conn = open_db(&path).unwrap();
            write_blob(&conn, "k", "v").unwrap();
        }
        let conn = open_db(&path).unwrap();
        assert_eq!(read_blob(&conn, "k").unwrap().as_deref(), Some("v"));
    }
}
