//! Core error types for focuscycle-core.
//!
//! Nothing in the timer itself is fatal; these errors surface from the
//! collaborators around it (storage, config, notification backends) and are
//! logged and absorbed at the timer boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuscycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persisted timer payload could not be used
    #[error("Invalid timer payload: {0}")]
    Payload(#[from] PayloadError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable at {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Reasons a persisted timer payload is rejected.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Not JSON at all
    #[error("malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Valid JSON but not an object
    #[error("expected a JSON object")]
    NotAnObject,

    /// Required field absent
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// Field present with the wrong JSON type
    #[error("field '{field}' should be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Notification backend errors. Never propagated out of the timer.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// No backend on this host
    #[error("notification backend unavailable")]
    Unavailable,

    /// Backend process could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Backend refused the message
    #[error("notification rejected: {0}")]
    Rejected(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_errors_read_well() {
        let e = PayloadError::WrongType {
            field: "notifyOn",
            expected: "boolean",
        };
        assert_eq!(e.to_string(), "field 'notifyOn' should be a boolean");
        let core: CoreError = PayloadError::MissingField("running").into();
        assert_eq!(core.to_string(), "Invalid timer payload: missing field 'running'");
    }

    #[test]
    fn sqlite_errors_map_to_query_failed() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StorageError::QueryFailed(_)));
    }
}
