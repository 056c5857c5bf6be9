//! Database connection management and migrations

use chrono::Utc;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("JSON parse error: {0}")]
    JsonParseError(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::QueryFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::JsonParseError(err.to_string())
    }
}

/// Wrapper around SQLite connection
pub struct Database {
    pub conn: Connection,
    pub path: Option<PathBuf>,
}

impl Database {
    /// Get the database file path inside a data directory
    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join("flowspace.sqlite")
    }
}

/// Open or create the local database under `data_dir`
pub fn open_database(data_dir: &Path) -> Result<Database, DatabaseError> {
    fs::create_dir_all(data_dir)
        .map_err(|e| DatabaseError::ConnectionFailed(format!("Failed to create {:?}: {}", data_dir, e)))?;

    let db_path = Database::db_path(data_dir);
    info!("Opening database at {:?}", db_path);

    let conn = Connection::open(&db_path)
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    run_migrations(&conn)?;

    Ok(Database {
        conn,
        path: Some(db_path),
    })
}

/// Open a throwaway in-memory database
pub fn open_in_memory() -> Result<Database, DatabaseError> {
    let conn = Connection::open_in_memory()
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
    run_migrations(&conn)?;
    Ok(Database { conn, path: None })
}

/// Current schema version, 0 for a fresh database
pub fn schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Run database schema migrations
fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = schema_version(conn);
    info!("Current schema version: {}", current_version);

    if current_version < 1 {
        info!("Applying migration v1: local storage");
        conn.execute_batch(include_str!("schema.sql"))
            .map_err(|e| DatabaseError::MigrationFailed(format!("Failed to apply v1 schema: {}", e)))?;
    }

    Ok(())
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database_is_migrated() {
        let db = open_in_memory().unwrap();
        assert_eq!(schema_version(&db.conn), 1);
    }

    #[test]
    fn test_reopen_does_not_reapply_schema() {
        let dir = tempfile::tempdir().unwrap();
        drop(open_database(dir.path()).unwrap());
        let db = open_database(dir.path()).unwrap();

        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(db.path, Some(Database::db_path(dir.path())));
    }
}
