//! Key/value store standing in for browser local storage
//!
//! Holds the bearer token and the persisted slice of application state.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use super::db::{now_rfc3339, open_database, open_in_memory, Database};
use super::DatabaseError;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const STATE_KEY: &str = "flowspace-storage";

/// Repository over the `local_storage` table
pub struct KeyValueRepo<'a> {
    conn: &'a Connection,
}

impl<'a> KeyValueRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool, DatabaseError> {
        let rows = self
            .conn
            .execute("DELETE FROM local_storage WHERE key = ?", [key])?;
        Ok(rows > 0)
    }
}

/// Thread-safe handle shared by the HTTP client and the store
pub struct LocalStorage {
    db: Mutex<Database>,
}

impl LocalStorage {
    pub fn open(data_dir: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_database(open_database(data_dir)?))
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_database(open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn with_repo<T>(
        &self,
        f: impl FnOnce(KeyValueRepo<'_>) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let db = self
            .db
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        f(KeyValueRepo::new(&db.conn))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.with_repo(|repo| repo.get(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        debug!("local storage set {}", key);
        self.with_repo(|repo| repo.set(key, value))
    }

    pub fn remove(&self, key: &str) -> Result<bool, DatabaseError> {
        debug!("local storage remove {}", key);
        self.with_repo(|repo| repo.remove(key))
    }

    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }

    pub fn token(&self) -> Result<Option<String>, DatabaseError> {
        self.get(AUTH_TOKEN_KEY)
    }

    /// Store the token, or clear it with `None`
    pub fn set_token(&self, token: Option<&str>) -> Result<(), DatabaseError> {
        match token {
            Some(token) => self.set(AUTH_TOKEN_KEY, token),
            None => self.remove(AUTH_TOKEN_KEY).map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_and_remove_clears() {
        let storage = LocalStorage::in_memory().unwrap();
        assert_eq!(storage.get("theme").unwrap(), None);

        storage.set("theme", "light").unwrap();
        storage.set("theme", "dark").unwrap();
        assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));

        assert!(storage.remove("theme").unwrap());
        assert!(!storage.remove("theme").unwrap());
        assert_eq!(storage.get("theme").unwrap(), None);
    }

    #[test]
    fn test_token_round_trip() {
        let storage = LocalStorage::in_memory().unwrap();
        storage.set_token(Some("abc.def")).unwrap();
        assert_eq!(storage.token().unwrap().as_deref(), Some("abc.def"));

        storage.set_token(None).unwrap();
        assert_eq!(storage.token().unwrap(), None);
    }

    #[test]
    fn test_corrupt_json_is_reported() {
        let storage = LocalStorage::in_memory().unwrap();
        storage.set(STATE_KEY, "{not json").unwrap();
        let result: Result<Option<serde_json::Value>, _> = storage.load_json(STATE_KEY);
        assert!(matches!(result, Err(DatabaseError::JsonParseError(_))));
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        LocalStorage::open(dir.path())
            .unwrap()
            .set_token(Some("persisted"))
            .unwrap();

        let reopened = LocalStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.token().unwrap().as_deref(), Some("persisted"));
    }
}
