//! padelbrain-core - Core library for PadelBrain
//!
//! This crate contains the record and profile models, the key-value storage
//! layer, the backup codec, conflict detection and merge engine used by the
//! PadelBrain interfaces.

pub mod backup;
pub mod conflict;
pub mod db;
pub mod error;
pub mod merge;
pub mod models;
pub mod profiles;
pub mod records;
pub mod session;
pub mod stats;
pub mod storage;
pub mod voice;

pub use backup::BackupDocument;
pub use error::{Error, Result};
pub use merge::MergeStrategy;
pub use models::{Profile, ProfileId, Record, RecordKind};
pub use session::{ImportOutcome, ImportPhase, ImportReport, PendingImport, Session};
