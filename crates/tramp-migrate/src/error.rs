//! Error types for the migration system.

use std::path::PathBuf;

use tramp_schema::{ConnectionError, SchemaError};

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Compiling a change-set's blueprints failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The connection failed outside of a change-set statement.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// IO error (reading configuration or change-set files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A change-set file could not be loaded.
    #[error("Failed to load change-set '{path}': {message}")]
    Load {
        /// Path to the change-set file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A statement of a change-set failed. The change-set is not recorded.
    #[error("Migration '{file}' failed after {completed} statement(s): {sql}")]
    Statement {
        /// Change-set file name.
        file: String,
        /// The failing statement.
        sql: String,
        /// Statements of this change-set that completed before the failure.
        completed: usize,
        /// The driver error.
        #[source]
        source: ConnectionError,
    },

    /// The change-set file is already recorded in the bookkeeping table.
    #[error("Migration '{0}' has already been migrated")]
    AlreadyMigrated(String),

    /// Two configured directories hold a change-set file of the same name.
    #[error("Migration '{file}' exists in both {} and {}", first.display(), second.display())]
    DuplicateMigration {
        file: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// No configured directory contains the change-set file.
    #[error("Migration not found: {0}")]
    MigrationNotFound(String),

    /// A bookkeeping row could not be read back.
    #[error("Invalid migration record: {0}")]
    InvalidRecord(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
