//! Match and training record model

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The two record collections kept per profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Played matches
    Matches,
    /// Training sessions
    Trainings,
}

impl RecordKind {
    /// All kinds, in the order they appear in a backup
    pub const ALL: [Self; 2] = [Self::Matches, Self::Trainings];

    /// Collection name used in backups and storage keys
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matches => "matches",
            Self::Trainings => "trainings",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "matches" | "match" => Ok(Self::Matches),
            "trainings" | "training" => Ok(Self::Trainings),
            other => Err(format!("unknown record kind '{other}'")),
        }
    }
}

/// A single match or training entry.
///
/// Only `id` and `date` are structural. Every other field is kept verbatim in
/// `attributes` so records written by other clients survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier within its collection
    pub id: String,
    /// ISO-8601 timestamp, also used as the "last modified" marker
    pub date: String,
    /// Free-form attributes (location, notes, wellness ratings, ...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Create a record with a fresh identifier
    #[must_use]
    pub fn new(date: impl Into<String>) -> Self {
        Self::with_id(Uuid::now_v7().to_string(), date)
    }

    /// Create a record with an explicit identifier
    #[must_use]
    pub fn with_id(id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Parsed `date`, if it is a recognized timestamp
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_record_date(&self.date)
    }

    /// String attribute by name, ignoring blank values
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Numeric attribute by name; numeric strings are accepted too
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.text("location")
    }

    pub fn partner(&self) -> Option<&str> {
        self.text("partner")
    }

    pub fn notes(&self) -> Option<&str> {
        self.text("notes")
    }

    /// Match outcome from the `result` attribute
    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.text("result").and_then(|value| value.parse().ok())
    }
}

/// Outcome of a played match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Win,
    Loss,
    Draw,
}

impl MatchOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }
}

impl FromStr for MatchOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win" | "won" | "victory" => Ok(Self::Win),
            "loss" | "lost" | "defeat" => Ok(Self::Loss),
            "draw" | "tie" => Ok(Self::Draw),
            other => Err(format!("unknown match result '{other}'")),
        }
    }
}

/// Parse a record date.
///
/// Accepts RFC 3339 timestamps, naive date-times (`T` or space separated,
/// read as UTC) and plain calendar dates (midnight UTC).
///
/// # Examples
///
/// ```
/// use padelbrain_core::models::parse_record_date;
///
/// assert!(parse_record_date("2025-01-05T10:00:00Z").is_some());
/// assert!(parse_record_date("2025-01-05").is_some());
/// assert!(parse_record_date("yesterday").is_none());
/// ```
#[must_use]
pub fn parse_record_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

/// Order two record dates.
///
/// Compares instants when both parse, otherwise falls back to plain string
/// ordering.
#[must_use]
pub fn compare_record_dates(left: &str, right: &str) -> Ordering {
    match (parse_record_date(left), parse_record_date(right)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => left.cmp(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_new_has_unique_id() {
        let first = Record::new("2025-01-01");
        let second = Record::new("2025-01-01");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_record_keeps_unknown_attributes() {
        let raw = json!({
            "id": "m1",
            "date": "2025-01-01T10:00:00.000Z",
            "location": "Club Norte",
            "sets": [[6, 4], [6, 3]],
            "mood": 4
        });

        let record: Record = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.location(), Some("Club Norte"));
        assert_eq!(record.number("mood"), Some(4.0));
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_parse_record_date_variants() {
        assert!(parse_record_date("2025-01-05T10:00:00.123Z").is_some());
        assert!(parse_record_date("2025-01-05T10:00:00+02:00").is_some());
        assert!(parse_record_date("2025-01-05 10:00:00").is_some());
        assert!(parse_record_date("2025-01-05").is_some());
        assert!(parse_record_date("").is_none());
        assert!(parse_record_date("05/01/2025").is_none());
    }

    #[test]
    fn test_compare_record_dates_is_temporal() {
        // Same instant written with different offsets
        assert_eq!(
            compare_record_dates("2025-01-05T12:00:00+02:00", "2025-01-05T10:00:00Z"),
            Ordering::Equal
        );
        assert_eq!(
            compare_record_dates("2025-01-05", "2025-01-01"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_record_dates_falls_back_to_strings() {
        assert_eq!(compare_record_dates("b", "a"), Ordering::Greater);
    }

    #[test]
    fn test_outcome_parsing() {
        let record = Record::with_id("m1", "2025-01-01").with_attribute("result", "Won");
        assert_eq!(record.outcome(), Some(MatchOutcome::Win));
        assert!("maybe".parse::<MatchOutcome>().is_err());
    }

    #[test]
    fn test_record_kind_parse() {
        assert_eq!("Match".parse::<RecordKind>(), Ok(RecordKind::Matches));
        assert_eq!("trainings".parse::<RecordKind>(), Ok(RecordKind::Trainings));
        assert!("notes".parse::<RecordKind>().is_err());
    }
}
