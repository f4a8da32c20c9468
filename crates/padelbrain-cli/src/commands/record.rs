use std::path::Path;

use padelbrain_core::models::MatchOutcome;
use padelbrain_core::{Record, RecordKind};

use crate::cli::{CommonRecordArgs, KindArg, MatchArgs, TrainingArgs};
use crate::commands::common::{
    format_record_lines, normalize_record_date, open_session, parse_attribute, resolve_record_id,
};
use crate::config::normalize_text_option;
use crate::error::CliError;

pub async fn run_add_match(
    args: MatchArgs,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let record = build_match_record(args)?;
    add_record(RecordKind::Matches, record, profile, db_path).await
}

pub async fn run_add_training(
    args: TrainingArgs,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let record = build_training_record(args)?;
    add_record(RecordKind::Trainings, record, profile, db_path).await
}

async fn add_record(
    kind: RecordKind,
    record: Record,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let mut session = open_session(db_path, profile).await?;
    let id = record.id.clone();
    session.add_record(kind, record).await?;
    println!("{id}");
    Ok(())
}

pub async fn run_list(
    kind: KindArg,
    limit: usize,
    as_json: bool,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let kind = RecordKind::from(kind);
    let session = open_session(db_path, profile).await?;
    let records = session.records().recent(kind, limit);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No {kind} recorded yet.");
    } else {
        for line in format_record_lines(kind, &records) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_remove(
    kind: KindArg,
    id: &str,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let kind = RecordKind::from(kind);
    let mut session = open_session(db_path, profile).await?;
    let resolved = resolve_record_id(session.records().records(kind), id)?;
    let removed = session.remove_record(kind, &resolved).await?;
    println!("{}", removed.id);
    Ok(())
}

pub fn build_match_record(args: MatchArgs) -> Result<Record, CliError> {
    let mut record = base_record(args.common)?;
    if let Some(result) = args.result {
        record = record.with_attribute("result", MatchOutcome::from(result).as_str());
    }
    if let Some(score) = normalize_text_option(args.score) {
        record = record.with_attribute("score", score);
    }
    Ok(record)
}

pub fn build_training_record(args: TrainingArgs) -> Result<Record, CliError> {
    let mut record = base_record(args.common)?;
    if let Some(duration) = args.duration {
        record = record.with_attribute("duration", duration);
    }

    let focus = args
        .focus
        .into_iter()
        .filter_map(|area| normalize_text_option(Some(area.to_lowercase())))
        .collect::<Vec<_>>();
    if !focus.is_empty() {
        record = record.with_attribute("focus", focus);
    }
    Ok(record)
}

/// Date plus shared attributes; named flags win over `--set` pairs
fn base_record(common: CommonRecordArgs) -> Result<Record, CliError> {
    let mut record = Record::new(normalize_record_date(common.date)?);

    for raw in &common.attributes {
        let (key, value) = parse_attribute(raw)?;
        record = record.with_attribute(key, value);
    }

    for (key, value) in [
        ("location", common.location),
        ("partner", common.partner),
        ("notes", common.notes),
    ] {
        if let Some(value) = normalize_text_option(value) {
            record = record.with_attribute(key, value);
        }
    }
    if let Some(mood) = common.mood {
        record = record.with_attribute("mood", mood);
    }

    Ok(record)
}
