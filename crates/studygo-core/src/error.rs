//! Core error types for studygo-core.
//!
//! Three families matter to callers: validation failures (bad user input,
//! nothing changed), storage failures (the persistence collaborator refused
//! or was unreachable) and configuration failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studygo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Bad user input; the operation was aborted without any state change.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence layer failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors surfaced directly to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A focus session needs a subject.
    #[error("Please select a subject first")]
    MissingSubject,

    /// Both hours and minutes were zero.
    #[error("Please set a duration")]
    ZeroDuration,

    /// Target hours could not be read as a non-negative number.
    #[error("Invalid target hours: '{0}'")]
    InvalidTarget(String),

    /// A required name was blank.
    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    /// Colors are `#rrggbb` hex strings.
    #[error("Invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    /// Weekly goal must be a positive number of hours within a week.
    #[error("Invalid weekly goal: {0} (expected 1-168 hours)")]
    InvalidWeeklyGoal(f64),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Storage collaborator errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Topic {topic_id} not found under subject {subject_id}")]
    TopicNotFound { subject_id: String, topic_id: String },

    /// The backend could not be reached or refused the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Persisted data could not be decoded.
    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    /// The backend requires a signed-in identity.
    #[error("Sign-in required")]
    AuthRequired,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created.
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
