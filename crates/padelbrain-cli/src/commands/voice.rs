use std::path::Path;

use padelbrain_core::voice::{extract, to_record, VoiceExtraction};

use crate::commands::common::{normalize_record_date, open_session};
use crate::error::CliError;

pub struct VoiceOptions {
    pub text: Vec<String>,
    pub save: bool,
    pub date: Option<String>,
    pub json: bool,
}

pub async fn run_voice(
    options: VoiceOptions,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let transcript = normalize_voice_text(&options.text)?;
    let extraction = extract(&transcript);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
    } else {
        for line in format_extraction_lines(&extraction) {
            println!("{line}");
        }
    }

    if options.save {
        let record = to_record(&extraction, normalize_record_date(options.date)?);
        let id = record.id.clone();
        let mut session = open_session(db_path, profile).await?;
        session.add_record(extraction.record_kind, record).await?;
        println!("Saved {} record {id}", extraction.record_kind);
    }

    Ok(())
}

pub fn normalize_voice_text(parts: &[String]) -> Result<String, CliError> {
    let text = parts
        .iter()
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        Err(CliError::EmptyVoiceText)
    } else {
        Ok(text)
    }
}

pub fn format_extraction_lines(extraction: &VoiceExtraction) -> Vec<String> {
    let mut lines = vec![format!("Kind:      {}", extraction.record_kind)];

    let fields = [
        ("Result", extraction.result.map(|result| result.as_str().to_string())),
        ("Score", extraction.score.clone()),
        ("Location", extraction.location.clone()),
        ("Partner", extraction.partner.clone()),
        (
            "Duration",
            extraction
                .duration_minutes
                .map(|minutes| format!("{minutes} min")),
        ),
        ("Mood", extraction.mood.map(|mood| format!("{mood}/5"))),
        (
            "Focus",
            (!extraction.focus.is_empty()).then(|| extraction.focus.join(", ")),
        ),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            lines.push(format!("{:<10} {value}", format!("{label}:")));
        }
    }

    lines
}
