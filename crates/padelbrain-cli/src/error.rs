use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] padelbrain_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record not found for id/prefix: {0}")]
    RecordNotFound(String),
    #[error("{0}")]
    AmbiguousRecordId(String),
    #[error("Invalid attribute '{0}'; expected KEY=VALUE")]
    InvalidAttribute(String),
    #[error("Invalid date '{0}'; use YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidDate(String),
    #[error("Voice text cannot be empty")]
    EmptyVoiceText,
    #[error(
        "The backup conflicts with local data. Rerun with --strategy use-local, use-remote, merge-smart or keep-both."
    )]
    StrategyRequired,
    #[error(
        "Unknown merge strategy '{0}'; choose one of use-local, use-remote, merge-smart or keep-both"
    )]
    UnknownStrategy(String),
    #[error("Import cancelled; nothing was changed")]
    ImportCancelled,
    #[error("Configuration error: {0}")]
    Config(String),
}
