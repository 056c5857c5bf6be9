//! Local persistence
//!
//! This module provides:
//! - SQLite connection management and schema migrations
//! - A key/value local storage for the auth token and state snapshot
//! - The JSON settings file

pub mod db;
pub mod local_storage;
pub mod settings;

pub use db::{open_database, Database, DatabaseError};
pub use local_storage::{KeyValueRepo, LocalStorage, AUTH_TOKEN_KEY, STATE_KEY};
pub use settings::{load_settings, read_settings, save_settings};
