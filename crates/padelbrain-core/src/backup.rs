//! Backup document codec.
//!
//! A backup is the full dataset of one profile: the profile itself plus both
//! record collections, exactly as they were on the exporting device. Decoding
//! treats the input as untrusted and validates every field the rest of the
//! crate relies on before producing a typed [`BackupDocument`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::{parse_record_date, Profile, ProfileId, Record, RecordKind};

/// Format version written by this crate
pub const BACKUP_FORMAT_VERSION: &str = "1.0.0";

/// Format versions accepted on import
pub const SUPPORTED_BACKUP_VERSIONS: [&str; 2] = ["1.0.0", "1.0"];

/// Serialized export of one profile's full dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub user: Profile,
    pub matches: Vec<Record>,
    pub trainings: Vec<Record>,
}

impl BackupDocument {
    /// Records of the given collection
    #[must_use]
    pub fn collection(&self, kind: RecordKind) -> &[Record] {
        match kind {
            RecordKind::Matches => &self.matches,
            RecordKind::Trainings => &self.trainings,
        }
    }
}

/// Build a backup document for the given profile data.
#[must_use]
pub fn export_backup(
    matches: &[Record],
    trainings: &[Record],
    profile: &Profile,
) -> BackupDocument {
    BackupDocument {
        version: BACKUP_FORMAT_VERSION.to_string(),
        export_date: Utc::now(),
        user: profile.clone(),
        matches: matches.to_vec(),
        trainings: trainings.to_vec(),
    }
}

/// Render a backup document as pretty-printed JSON.
pub fn encode(document: &BackupDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse and validate backup text.
///
/// Fails with [`Error::MalformedInput`] when the text is not JSON and with
/// [`Error::SchemaViolation`] listing every offending field when the JSON
/// does not have the backup shape.
pub fn decode(text: &str) -> Result<BackupDocument> {
    let value: Value =
        serde_json::from_str(text).map_err(|error| Error::MalformedInput(error.to_string()))?;

    let violations = validate_document(&value);
    if !violations.is_empty() {
        tracing::debug!(
            "Rejected backup with {} schema violations",
            violations.len()
        );
        return Err(Error::SchemaViolation { fields: violations });
    }

    serde_json::from_value(value).map_err(|error| {
        tracing::debug!("Validated backup failed to deserialize: {error}");
        Error::SchemaViolation {
            fields: vec!["document".to_string()],
        }
    })
}

/// Build a deterministic default file name for a backup.
#[must_use]
pub fn suggested_backup_file_name(profile_name: &str, timestamp_ms: i64) -> String {
    let slug = profile_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        format!("padelbrain-backup-{timestamp_ms}.json")
    } else {
        format!("padelbrain-backup-{slug}-{timestamp_ms}.json")
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_document(value: &Value) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return vec!["document".to_string()];
    };

    let mut violations = Vec::new();

    match object.get("version").and_then(Value::as_str) {
        Some(version) if SUPPORTED_BACKUP_VERSIONS.contains(&version.trim()) => {}
        _ => violations.push("version".to_string()),
    }

    if !is_timestamp(object.get("exportDate")) {
        violations.push("exportDate".to_string());
    }

    match object.get("user").and_then(Value::as_object) {
        Some(user) => validate_user(user, &mut violations),
        None => violations.push("user".to_string()),
    }

    for kind in RecordKind::ALL {
        validate_collection(object, kind.as_str(), &mut violations);
    }

    violations
}

fn validate_user(user: &Map<String, Value>, violations: &mut Vec<String>) {
    let id_valid = user
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.parse::<ProfileId>().is_ok());
    if !id_valid {
        violations.push("user.id".to_string());
    }

    if !user.get("name").is_some_and(Value::is_string) {
        violations.push("user.name".to_string());
    }

    if !is_timestamp(user.get("createdAt")) {
        violations.push("user.createdAt".to_string());
    }

    for field in ["email", "avatar", "deviceId"] {
        if !matches!(user.get(field), None | Some(Value::Null | Value::String(_))) {
            violations.push(format!("user.{field}"));
        }
    }

    if !matches!(user.get("lastSyncAt"), None | Some(Value::Null))
        && !is_timestamp(user.get("lastSyncAt"))
    {
        violations.push("user.lastSyncAt".to_string());
    }
}

fn validate_collection(object: &Map<String, Value>, name: &str, violations: &mut Vec<String>) {
    let Some(records) = object.get(name).and_then(Value::as_array) else {
        violations.push(name.to_string());
        return;
    };

    let mut seen_ids = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        let Some(record) = record.as_object() else {
            violations.push(format!("{name}[{index}]"));
            continue;
        };

        match record.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() && seen_ids.insert(id) => {}
            _ => violations.push(format!("{name}[{index}].id")),
        }

        let date_valid = record
            .get("date")
            .and_then(Value::as_str)
            .is_some_and(|date| parse_record_date(date).is_some());
        if !date_valid {
            violations.push(format!("{name}[{index}].date"));
        }
    }
}

/// Profile and export timestamps are machine-written RFC 3339 strings
fn is_timestamp(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|raw| DateTime::parse_from_rfc3339(raw).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "version": "1.0.0",
            "exportDate": "2025-01-10T08:00:00.000Z",
            "user": {
                "id": "0190a5b8-7c2e-7d3f-8a1b-2c3d4e5f6a7b",
                "name": "Ana",
                "createdAt": "2024-12-01T10:00:00.000Z"
            },
            "matches": [
                {"id": "a", "date": "2025-01-01", "location": "Club Norte", "result": "win"}
            ],
            "trainings": [
                {"id": "t1", "date": "2025-01-03T18:30:00.000Z", "duration": 60}
            ]
        })
    }

    fn schema_fields(result: Result<BackupDocument>) -> Vec<String> {
        match result {
            Err(Error::SchemaViolation { fields }) => fields,
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn decode_valid_document() {
        let document = decode(&sample_document().to_string()).unwrap();

        assert_eq!(document.version, "1.0.0");
        assert_eq!(document.user.name, "Ana");
        assert_eq!(document.matches.len(), 1);
        assert_eq!(document.matches[0].location(), Some("Club Norte"));
        assert_eq!(document.trainings[0].number("duration"), Some(60.0));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(matches!(
            decode("{not valid"),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn decode_names_missing_collection() {
        let mut value = sample_document();
        value.as_object_mut().unwrap().remove("matches");

        assert_eq!(schema_fields(decode(&value.to_string())), vec!["matches"]);
    }

    #[test]
    fn decode_reports_every_bad_record_field() {
        let mut value = sample_document();
        value["matches"] = json!([
            {"date": "2025-01-01"},
            {"id": "b", "date": "not a date"},
            {"id": "", "date": "2025-01-02"},
            "oops"
        ]);

        assert_eq!(
            schema_fields(decode(&value.to_string())),
            vec![
                "matches[0].id",
                "matches[1].date",
                "matches[2].id",
                "matches[3]",
            ]
        );
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let mut value = sample_document();
        value["trainings"] = json!([
            {"id": "t1", "date": "2025-01-01"},
            {"id": "t1", "date": "2025-01-02"}
        ]);

        assert_eq!(
            schema_fields(decode(&value.to_string())),
            vec!["trainings[1].id"]
        );
    }

    #[test]
    fn decode_rejects_unknown_version_and_bad_user() {
        let mut value = sample_document();
        value["version"] = json!("9.9.9");
        value["user"]["id"] = json!("user-1");
        value["user"]["email"] = json!(42);

        assert_eq!(
            schema_fields(decode(&value.to_string())),
            vec!["version", "user.id", "user.email"]
        );
    }

    #[test]
    fn decode_accepts_legacy_version_and_null_optionals() {
        let mut value = sample_document();
        value["version"] = json!("1.0");
        value["user"]["avatar"] = Value::Null;
        value["user"]["lastSyncAt"] = Value::Null;

        let document = decode(&value.to_string()).unwrap();
        assert_eq!(document.user.avatar, None);
        assert_eq!(document.user.last_sync_at, None);
    }

    #[test]
    fn decode_rejects_non_object_root() {
        assert_eq!(schema_fields(decode("[]")), vec!["document"]);
    }

    #[test]
    fn export_then_decode_round_trips() {
        let mut profile = Profile::new("Ana");
        profile.email = Some("ana@example.com".to_string());
        profile.device_id = Some("device-1".to_string());
        let matches = vec![Record::with_id("a", "2025-01-01T10:00:00Z")
            .with_attribute("partner", "Luis")
            .with_attribute("score", "6-4 6-3")];
        let trainings = vec![Record::with_id("t", "2025-01-02").with_attribute("mood", 4)];

        let document = export_backup(&matches, &trainings, &profile);
        let decoded = decode(&encode(&document).unwrap()).unwrap();

        assert_eq!(decoded, document);
        assert_eq!(decoded.user, profile);
        assert_eq!(decoded.matches, matches);
        assert_eq!(decoded.trainings, trainings);
    }

    #[test]
    fn suggested_backup_file_name_slugs_profile_name() {
        assert_eq!(
            suggested_backup_file_name("  Ana María López ", 123),
            "padelbrain-backup-ana-mar-a-l-pez-123.json"
        );
        assert_eq!(
            suggested_backup_file_name("", 5),
            "padelbrain-backup-5.json"
        );
    }
}
