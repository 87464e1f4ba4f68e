//! Core error types for dateplanner-core.
//!
//! This module defines the error hierarchy using thiserror. Most failures
//! inside the progression core are recovered locally (resets, discarded
//! pending unlocks, logged write failures); the types here cover what is
//! left for callers to see.

use std::path::PathBuf;
use thiserror::Error;

use crate::progression::{Operation, StageState};

/// Core error type for dateplanner-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected progression operations
    #[error("Progression error: {0}")]
    Progression(#[from] ProgressionError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value storage errors.
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

    /// Backend refused the operation (quota, read-only medium, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dotted configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The stage registry has no stages at all
    #[error("Stage registry must contain at least one stage")]
    EmptyRegistry,

    /// A stage was defined without any options to pick from
    #[error("Stage '{stage_id}' has an empty option list")]
    EmptyOptions { stage_id: String },

    /// Two stages share the same id
    #[error("Duplicate stage id: {0}")]
    DuplicateStageId(String),

    /// Home/data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Rejected progression operations.
///
/// A rejected operation never mutates the snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    /// Stage index does not exist in the registry
    #[error("Stage index {index} out of bounds (stage count: {len})")]
    StageOutOfRange { index: usize, len: usize },

    /// Operation is not allowed from the stage's current state
    #[error("Cannot {operation} stage {index} while it is {state}")]
    InvalidTransition {
        index: usize,
        operation: Operation,
        state: StageState,
    },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
