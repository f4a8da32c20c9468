//! Data models for PadelBrain

mod profile;
mod record;

pub use profile::{Profile, ProfileId};
pub use record::{compare_record_dates, parse_record_date, MatchOutcome, Record, RecordKind};
