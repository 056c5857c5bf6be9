//! Crate-wide error type
//!
//! The `Display` text of every variant is what ends up in the error toast,
//! so messages are written for the person using the dashboard.

use std::path::PathBuf;

use crate::services::lifecycle::LifecycleError;
use crate::storage::DatabaseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-2xx response, already normalized into a readable message
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error occurred: {0}")]
    Network(String),

    #[error("You are not signed in")]
    Unauthenticated,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("This action is already in progress")]
    Busy,

    #[error("Local storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Failed to read {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_message_only() {
        let err = Error::Api {
            status: 404,
            message: "The requested resource was not found.".to_string(),
        };
        assert_eq!(err.to_string(), "The requested resource was not found.");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_unauthorized());
    }
}
