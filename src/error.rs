//! Error types for yion-kit operations.
//!
//! This module provides the error hierarchy using `thiserror` for the
//! document stores, the i18n layer, and CLI commands.

use thiserror::Error;

/// Result type alias for yion-kit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors (database and collection files).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Translation and locale errors.
    #[error("i18n error: {0}")]
    I18n(#[from] I18nError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Builds a configuration error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Storage-specific errors.
///
/// `Database` carries the engine's own message unmodified so callers can map
/// it into their own error model.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage engine rejected the statement or could not be opened.
    #[error("database error: {0}")]
    Database(String),

    /// The store was closed; no further operations are possible.
    #[error("store is closed")]
    Closed,

    /// Collection is not in the store's allow-list.
    #[error("collection {name} does not exist")]
    UnknownCollection {
        /// Name of the rejected collection.
        name: String,
    },

    /// Update or remove called without any predicate field.
    #[error("{operation} requires at least one query field")]
    EmptyPredicate {
        /// Operation that was refused.
        operation: &'static str,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File system error on a collection or database file.
    #[error("I/O error: {path}: {reason}")]
    Io {
        /// Path that failed.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The blocking task running a statement panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Translation catalogue and locale errors.
#[derive(Error, Debug)]
pub enum I18nError {
    /// Translation file could not be read.
    #[error("failed to read translations: {path}: {reason}")]
    ReadFailed {
        /// Path to the file or folder.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Translation file is not a JSON object.
    #[error("invalid translation file {path}: {reason}")]
    InvalidFile {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
