//! Error types for padelbrain-core

use thiserror::Error;

/// Result type alias using padelbrain-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in padelbrain-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Backup text is not valid JSON
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Backup JSON parsed but does not have the expected shape
    #[error(
        "Backup does not match the expected schema (invalid fields: {})",
        fields.join(", ")
    )]
    SchemaViolation {
        /// Paths of the violated fields, e.g. `matches[0].date`
        fields: Vec<String>,
    },

    /// Backup identity differs from the one the caller expected
    #[error("Profile mismatch: expected {expected}, backup belongs to {found}")]
    ProfileMismatch { expected: String, found: String },

    /// Storage operation kept failing after automatic retries
    #[error("Storage {operation} failed for key '{key}' after {attempts} attempts: {message}")]
    StorageFailure {
        operation: &'static str,
        key: String,
        attempts: u32,
        message: String,
    },

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Profile or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record operation attempted without an active profile
    #[error("No active profile. Create one or switch to an existing profile first.")]
    NoActiveProfile,

    /// A record with the same identifier already exists in the collection
    #[error("Record already exists: {0}")]
    DuplicateRecord(String),
}

impl Error {
    /// Whether the error comes from the storage backend and may be transient.
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::LibSql(_) | Self::Io(_))
    }
}
