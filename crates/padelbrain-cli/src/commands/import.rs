use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use padelbrain_core::backup::decode;
use padelbrain_core::conflict::ConflictDescriptor;
use padelbrain_core::merge::MergeStrategy;
use padelbrain_core::{ImportOutcome, ProfileId};

use crate::commands::common::{
    format_conflict_lines, format_import_report, open_session, parse_strategy_choice,
    parse_strategy_name, CliSession,
};
use crate::error::CliError;

pub struct ImportOptions {
    pub path: PathBuf,
    pub strategy: Option<String>,
    pub detect_only: bool,
    pub expect_profile: Option<String>,
    pub json: bool,
    /// Whether the user can be prompted for a strategy
    pub interactive: bool,
}

pub async fn run_import(
    options: ImportOptions,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let strategy = options
        .strategy
        .as_deref()
        .map(parse_strategy_name)
        .transpose()?;
    let text = std::fs::read_to_string(&options.path)?;
    let mut session = open_session(db_path, profile).await?;

    if let Some(expected) = options.expect_profile.as_deref() {
        let id = resolve_expected_profile(&session, expected)?;
        session.set_expected_profile(Some(id));
    }

    if options.detect_only {
        return report_conflicts_only(&session, &text, options.json).await;
    }

    let report = match session.begin_import(&text).await? {
        ImportOutcome::Completed(report) => report,
        ImportOutcome::NeedsStrategy(pending) => {
            let choice = match strategy {
                Some(strategy) => Ok(strategy),
                None if options.interactive => prompt_strategy(pending.conflicts()),
                None => Err(CliError::StrategyRequired),
            };
            match choice {
                Ok(strategy) => session.resolve_import(pending, strategy).await?,
                Err(error) => {
                    session.cancel_import(pending);
                    return Err(error);
                }
            }
        }
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_import_report(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn report_conflicts_only(
    session: &CliSession,
    text: &str,
    as_json: bool,
) -> Result<(), CliError> {
    let document = decode(text)?;
    let known = session
        .list_profiles()
        .iter()
        .any(|profile| profile.id == document.user.id);
    let conflicts = session.detect_only(&document).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&conflicts)?);
    } else if !known {
        println!(
            "Backup belongs to profile {} which is not on this device; importing adds it.",
            document.user.name
        );
    } else {
        match conflicts {
            None => println!("No conflicts with local data."),
            Some(conflicts) => {
                for line in format_conflict_lines(&conflicts) {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}

/// Full profile id, or a profile known on this device
pub fn resolve_expected_profile(session: &CliSession, query: &str) -> Result<ProfileId, CliError> {
    if let Ok(id) = query.parse::<ProfileId>() {
        return Ok(id);
    }
    Ok(session.resolve_profile(query)?.id)
}

fn prompt_strategy(conflicts: &[ConflictDescriptor]) -> Result<MergeStrategy, CliError> {
    println!("The backup differs from local data:");
    for line in format_conflict_lines(conflicts) {
        println!("  {line}");
    }
    println!("Choose how to merge:");
    for (index, strategy) in MergeStrategy::SELECTABLE.iter().enumerate() {
        println!("  {}) {strategy}", index + 1);
    }
    print!("Strategy [empty to cancel]: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    parse_strategy_choice(&answer).ok_or(CliError::ImportCancelled)
}
