use std::path::Path;

use chrono::Local;
use padelbrain_core::conflict::ConflictDescriptor;
use padelbrain_core::db::{Database, LibSqlKeyValueStore};
use padelbrain_core::merge::{ChangeTally, MergeStrategy};
use padelbrain_core::models::{parse_record_date, Profile, ProfileId, Record, RecordKind};
use padelbrain_core::storage::{RetryPolicy, RetryingStore};
use padelbrain_core::{ImportReport, Session};
use serde_json::Value;

use crate::error::CliError;

pub type CliSession = Session<RetryingStore<LibSqlKeyValueStore>>;

const SHORT_ID_LEN: usize = 13;

/// Open the database and session, activating `profile` when given
pub async fn open_session(db_path: &Path, profile: Option<&str>) -> Result<CliSession, CliError> {
    let db = Database::open(db_path).await?;
    let storage = RetryingStore::new(LibSqlKeyValueStore::new(db), RetryPolicy::default());
    tracing::debug!("Storage retry policy: {:?}", storage.policy());

    let mut session = Session::open(storage).await?;
    if let Some(selector) = profile {
        let id = session.resolve_profile(selector)?.id;
        if session.active_profile().map(|active| active.id) != Some(id) {
            session.switch_profile(&id).await?;
        }
    }
    Ok(session)
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Validate a user-supplied record date, defaulting to today
pub fn normalize_record_date(date: Option<String>) -> Result<String, CliError> {
    let Some(date) = date.map(|value| value.trim().to_string()) else {
        return Ok(today());
    };
    if parse_record_date(&date).is_none() {
        return Err(CliError::InvalidDate(date));
    }
    Ok(date)
}

/// Parse `key=value`; numbers and booleans keep their JSON type
pub fn parse_attribute(raw: &str) -> Result<(String, Value), CliError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(CliError::InvalidAttribute(raw.to_string()));
    };
    let key = key.trim();
    if key.is_empty() || key == "id" || key == "date" {
        return Err(CliError::InvalidAttribute(raw.to_string()));
    }

    let value = value.trim();
    let parsed = match serde_json::from_str::<Value>(value) {
        Ok(number @ Value::Number(_)) => number,
        Ok(boolean @ Value::Bool(_)) => boolean,
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), parsed))
}

/// Find a record by exact id or unique id prefix
pub fn resolve_record_id(records: &[Record], query: &str) -> Result<String, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::RecordNotFound(query.to_string()));
    }
    if records.iter().any(|record| record.id == query) {
        return Ok(query.to_string());
    }

    let matching = records
        .iter()
        .filter(|record| record.id.starts_with(query))
        .map(|record| record.id.as_str())
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::RecordNotFound(query.to_string())),
        [id] => Ok((*id).to_string()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousRecordId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Read a strategy picked at the prompt, by number or by name
pub fn parse_strategy_choice(input: &str) -> Option<MergeStrategy> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|index| MergeStrategy::SELECTABLE.get(index))
            .copied();
    }

    input
        .parse::<MergeStrategy>()
        .ok()
        .filter(|strategy| MergeStrategy::SELECTABLE.contains(strategy))
}

/// Parse a strategy given by flag or config; only selectable names are accepted
pub fn parse_strategy_name(name: &str) -> Result<MergeStrategy, CliError> {
    name.parse::<MergeStrategy>()
        .ok()
        .filter(|strategy| MergeStrategy::SELECTABLE.contains(strategy))
        .ok_or_else(|| CliError::UnknownStrategy(name.trim().to_string()))
}

fn display_date(date: &str) -> String {
    parse_record_date(date).map_or_else(
        || date.to_string(),
        |parsed| parsed.format("%Y-%m-%d").to_string(),
    )
}

/// One-line description of a record's main attributes
pub fn record_summary(kind: RecordKind, record: &Record) -> String {
    let mut parts = Vec::new();

    match kind {
        RecordKind::Matches => {
            if let Some(outcome) = record.outcome() {
                parts.push(outcome.as_str().to_uppercase());
            }
            if let Some(score) = record.text("score") {
                parts.push(score.to_string());
            }
        }
        RecordKind::Trainings => {
            if let Some(minutes) = record.number("duration") {
                parts.push(format!("{minutes} min"));
            }
            if let Some(Value::Array(focus)) = record.attributes.get("focus") {
                let focus = focus
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !focus.is_empty() {
                    parts.push(focus);
                }
            }
        }
    }

    if let Some(location) = record.location() {
        parts.push(format!("@ {location}"));
    }
    if let Some(partner) = record.partner() {
        parts.push(format!("with {partner}"));
    }
    if parts.is_empty() {
        if let Some(notes) = record.notes() {
            parts.push(notes.lines().next().unwrap_or_default().to_string());
        }
    }

    parts.join(" ")
}

pub fn format_record_lines(kind: RecordKind, records: &[&Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let id = short_id(&record.id);
            let date = display_date(&record.date);
            let summary = record_summary(kind, record);
            format!("{id:<13}  {date:<10}  {summary}")
        })
        .collect()
}

pub fn format_profile_lines(profiles: &[Profile], active: Option<&ProfileId>) -> Vec<String> {
    profiles
        .iter()
        .map(|profile| {
            let marker = if Some(&profile.id) == active { '*' } else { ' ' };
            let id = profile.short_id();
            match &profile.email {
                Some(email) => format!("{marker} {id:<13}  {}  <{email}>", profile.name),
                None => format!("{marker} {id:<13}  {}", profile.name),
            }
        })
        .collect()
}

pub fn format_conflict_lines(conflicts: &[ConflictDescriptor]) -> Vec<String> {
    conflicts
        .iter()
        .flat_map(|conflict| {
            [
                format!(
                    "{}: {} here, {} in backup; {} only here, {} only in backup, {} modified",
                    conflict.kind,
                    conflict.local.count,
                    conflict.remote.count,
                    conflict.only_in_local.len(),
                    conflict.only_in_remote.len(),
                    conflict.modified.len()
                ),
                format!(
                    "  latest here {}, latest in backup {}",
                    display_date(&conflict.local.last_modified),
                    display_date(&conflict.remote.last_modified)
                ),
            ]
        })
        .collect()
}

pub fn format_tally_lines(tally: &ChangeTally) -> Vec<String> {
    RecordKind::ALL
        .iter()
        .map(|kind| {
            let counts = tally.get(*kind);
            format!(
                "{kind}: {} added, {} updated, {} skipped",
                counts.added, counts.updated, counts.skipped
            )
        })
        .collect()
}

pub fn format_import_report(report: &ImportReport) -> Vec<String> {
    let id = short_id(&report.profile_id.to_string());
    let mut lines = vec![if report.new_profile {
        format!("Imported new profile {} ({id})", report.profile_name)
    } else {
        format!(
            "Imported into {} ({id}) using {}",
            report.profile_name, report.strategy
        )
    }];
    if report.switched_profile {
        lines.push(format!("Active profile is now {}", report.profile_name));
    }
    lines.extend(format_tally_lines(&report.tally));
    lines
}
