//! Free-text extraction for dictated match and training notes.
//!
//! Every rule is a keyword table or a regex applied to the transcript. The
//! extraction never fails: fields that cannot be found are left empty and
//! the transcript is kept verbatim as the record's notes.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{MatchOutcome, Record, RecordKind};

const WIN_WORDS: &[&str] = &["won", "win", "victory", "ganamos", "ganado", "ganar"];
const LOSS_WORDS: &[&str] = &["lost", "lose", "defeat", "perdimos", "perdido", "perder"];
const NEGATIONS: &[&str] = &["didn't", "didnt", "not", "never", "no", "nunca"];

const TRAINING_WORDS: &[&str] = &[
    "training",
    "train",
    "trained",
    "practice",
    "practiced",
    "drill",
    "drills",
    "entreno",
    "entrenamiento",
    "entrené",
];

const POSITIVE_WORDS: &[&str] = &[
    "great", "good", "amazing", "happy", "confident", "excellent", "fantastic", "motivated",
    "genial", "bien", "contento", "feliz",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "tired", "frustrated", "terrible", "awful", "sad", "angry", "exhausted", "mal",
    "cansado", "frustrado", "horrible",
];

/// Canonical focus area and the words that name it
const FOCUS_AREAS: &[(&str, &[&str])] = &[
    ("volley", &["volley", "volleys", "volea", "voleas"]),
    ("smash", &["smash", "smashes", "remate", "remates"]),
    ("bandeja", &["bandeja", "bandejas"]),
    ("serve", &["serve", "serves", "serving", "saque", "saques"]),
    ("lob", &["lob", "lobs", "globo", "globos"]),
    ("defense", &["defense", "defence", "defending", "defensa"]),
    ("footwork", &["footwork"]),
    ("fitness", &["fitness", "cardio", "physical", "físico"]),
];

/// Words that end a location or partner phrase
const PHRASE_STOP_WORDS: &[&str] = &[
    "with", "con", "at", "in", "en", "and", "y", "against", "contra", "today", "yesterday",
    "hoy", "ayer", "the", "a", "my", "we", "i", "for", "por", "on", "el", "la", "mi",
];
const MAX_PHRASE_WORDS: usize = 4;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid regex"));

static SET_SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-7])\s*[-/]\s*([0-7])\b").expect("valid regex"));

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:at|en)\s+(\p{L}[\p{L}\p{N}\s'-]*)").expect("valid regex")
});

// "in" is too common to trust unless a capitalized name follows
static LOCATION_IN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[Ii]n\s+(\p{Lu}[\p{L}\p{N}\s'-]*)").expect("valid regex")
});

static PARTNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:with|con|partner)\s+(?:my\s+partner\s+|partner\s+|mi\s+compañer[oa]\s+)?(\p{L}[\p{L}'-]*(?:\s+\p{L}[\p{L}'-]*)?)",
    )
    .expect("valid regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+(?:[.,]\d+)?)\s*(hours?|hrs?|h|horas?|minutes?|mins?|minutos?)\b",
    )
    .expect("valid regex")
});

/// Fields recognized in a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceExtraction {
    pub transcript: String,
    pub record_kind: RecordKind,
    pub result: Option<MatchOutcome>,
    /// Normalized set scores, e.g. `6-4 3-6 7-5`
    pub score: Option<String>,
    pub location: Option<String>,
    pub partner: Option<String>,
    pub duration_minutes: Option<u32>,
    /// 1 (bad) to 5 (great)
    pub mood: Option<u8>,
    pub focus: Vec<String>,
}

/// Extract structured fields from free text
#[must_use]
pub fn extract(text: &str) -> VoiceExtraction {
    let normalized = text.replace('’', "'");
    let lowered = normalized.to_lowercase();
    let words = WORD_RE
        .find_iter(&lowered)
        .map(|found| found.as_str())
        .collect::<Vec<_>>();

    let result = extract_result(&words);
    let is_training = words.iter().any(|word| TRAINING_WORDS.contains(word));
    let record_kind = if is_training && result.is_none() {
        RecordKind::Trainings
    } else {
        RecordKind::Matches
    };

    let extraction = VoiceExtraction {
        transcript: text.trim().to_string(),
        record_kind,
        result,
        score: extract_score(&normalized),
        location: extract_location(&normalized),
        partner: extract_partner(&normalized),
        duration_minutes: extract_duration(&normalized),
        mood: extract_mood(&words),
        focus: extract_focus(&words),
    };

    tracing::debug!(
        "Extracted {} from transcript: result={:?} score={:?} location={:?} partner={:?}",
        extraction.record_kind,
        extraction.result,
        extraction.score,
        extraction.location,
        extraction.partner
    );
    extraction
}

/// Build a record of the extracted kind dated `date`
#[must_use]
pub fn to_record(extraction: &VoiceExtraction, date: impl Into<String>) -> Record {
    let mut record = Record::new(date);

    if let Some(result) = extraction.result {
        record = record.with_attribute("result", result.as_str());
    }
    if let Some(score) = &extraction.score {
        record = record.with_attribute("score", score.as_str());
    }
    if let Some(location) = &extraction.location {
        record = record.with_attribute("location", location.as_str());
    }
    if let Some(partner) = &extraction.partner {
        record = record.with_attribute("partner", partner.as_str());
    }
    if let Some(minutes) = extraction.duration_minutes {
        record = record.with_attribute("duration", minutes);
    }
    if let Some(mood) = extraction.mood {
        record = record.with_attribute("mood", mood);
    }
    if !extraction.focus.is_empty() {
        record = record.with_attribute("focus", extraction.focus.clone());
    }
    if !extraction.transcript.is_empty() {
        record = record.with_attribute("notes", extraction.transcript.as_str());
    }

    record
}

/// First non-negated result keyword
fn extract_result(words: &[&str]) -> Option<MatchOutcome> {
    words.iter().enumerate().find_map(|(index, word)| {
        let outcome = if WIN_WORDS.contains(word) {
            MatchOutcome::Win
        } else if LOSS_WORDS.contains(word) {
            MatchOutcome::Loss
        } else {
            return None;
        };

        let negated = index
            .checked_sub(1)
            .is_some_and(|previous| NEGATIONS.contains(&words[previous]));
        (!negated).then_some(outcome)
    })
}

fn extract_score(text: &str) -> Option<String> {
    let sets = SET_SCORE_RE
        .captures_iter(text)
        .map(|captures| format!("{}-{}", &captures[1], &captures[2]))
        .collect::<Vec<_>>();
    (!sets.is_empty()).then(|| sets.join(" "))
}

fn extract_location(text: &str) -> Option<String> {
    [&*LOCATION_RE, &*LOCATION_IN_RE]
        .into_iter()
        .flat_map(|regex| regex.captures_iter(text))
        .find_map(|captures| clip_phrase(&captures[1]))
}

fn extract_partner(text: &str) -> Option<String> {
    PARTNER_RE
        .captures_iter(text)
        .find_map(|captures| clip_phrase(&captures[1]))
}

/// Keep the leading words of a phrase up to the first stop word
fn clip_phrase(phrase: &str) -> Option<String> {
    let words = phrase
        .split_whitespace()
        .take_while(|word| !PHRASE_STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .take(MAX_PHRASE_WORDS)
        .collect::<Vec<_>>();
    (!words.is_empty()).then(|| words.join(" "))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn extract_duration(text: &str) -> Option<u32> {
    let captures = DURATION_RE.captures(text)?;
    let amount: f64 = captures[1].replace(',', ".").parse().ok()?;
    let unit = captures[2].to_lowercase();
    let minutes = if unit.starts_with('h') {
        amount * 60.0
    } else {
        amount
    };

    (minutes.is_finite() && minutes > 0.0 && minutes < f64::from(u32::MAX))
        .then(|| minutes.round() as u32)
}

fn extract_mood(words: &[&str]) -> Option<u8> {
    let positive = words
        .iter()
        .filter(|word| POSITIVE_WORDS.contains(word))
        .count();
    let negative = words
        .iter()
        .filter(|word| NEGATIVE_WORDS.contains(word))
        .count();
    if positive == 0 && negative == 0 {
        return None;
    }

    let mood = if positive >= negative {
        3 + (positive - negative).min(2)
    } else {
        3 - (negative - positive).min(2)
    };
    u8::try_from(mood).ok()
}

fn extract_focus(words: &[&str]) -> Vec<String> {
    FOCUS_AREAS
        .iter()
        .filter(|(_, aliases)| words.iter().any(|word| aliases.contains(word)))
        .map(|(canonical, _)| (*canonical).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_a_full_match_report() {
        let extraction =
            extract("We won 6-4 3-6 7-5 at Club Norte with Luis, felt great");

        assert_eq!(extraction.record_kind, RecordKind::Matches);
        assert_eq!(extraction.result, Some(MatchOutcome::Win));
        assert_eq!(extraction.score.as_deref(), Some("6-4 3-6 7-5"));
        assert_eq!(extraction.location.as_deref(), Some("Club Norte"));
        assert_eq!(extraction.partner.as_deref(), Some("Luis"));
        assert_eq!(extraction.mood, Some(4));
    }

    #[test]
    fn result_keywords_in_spanish() {
        assert_eq!(
            extract("Hoy perdimos en el club").result,
            Some(MatchOutcome::Loss)
        );
        assert_eq!(
            extract("ganamos el partido").result,
            Some(MatchOutcome::Win)
        );
    }

    #[test]
    fn negated_loss_is_ignored() {
        let extraction = extract("We didn't lose a single set, we won");
        assert_eq!(extraction.result, Some(MatchOutcome::Win));

        assert_eq!(extract("didn't lose").result, None);
    }

    #[test]
    fn score_accepts_slashes_and_rejects_out_of_range_sets() {
        assert_eq!(extract("lost 4/6 2/6").score.as_deref(), Some("4-6 2-6"));
        assert_eq!(extract("final 9-8").score, None);
    }

    #[test]
    fn location_after_in_requires_a_name() {
        assert_eq!(
            extract("Played in Madrid with Ana").location.as_deref(),
            Some("Madrid")
        );
        assert_eq!(extract("won in three sets").location, None);
    }

    #[test]
    fn partner_phrases() {
        assert_eq!(
            extract("partner Marta Ruiz today").partner.as_deref(),
            Some("Marta Ruiz")
        );
        assert_eq!(
            extract("jugamos con mi compañero Pablo").partner.as_deref(),
            Some("Pablo")
        );
        assert_eq!(extract("with a lot of energy").partner, None);
    }

    #[test]
    fn duration_units() {
        assert_eq!(extract("90 minutes of drills").duration_minutes, Some(90));
        assert_eq!(extract("1.5 hours practice").duration_minutes, Some(90));
        assert_eq!(extract("2h session").duration_minutes, Some(120));
        assert_eq!(extract("45 min").duration_minutes, Some(45));
        assert_eq!(extract("no time given").duration_minutes, None);
    }

    #[test]
    fn mood_tally_is_clamped() {
        assert_eq!(extract("great good amazing happy").mood, Some(5));
        assert_eq!(extract("tired and frustrated, terrible").mood, Some(1));
        assert_eq!(extract("good but tired").mood, Some(3));
        assert_eq!(extract("nothing to report").mood, None);
    }

    #[test]
    fn training_focus_and_kind() {
        let extraction = extract("Training: smash and volley drills, then footwork, 60 min");

        assert_eq!(extraction.record_kind, RecordKind::Trainings);
        assert_eq!(extraction.focus, vec!["volley", "smash", "footwork"]);
        assert_eq!(extraction.duration_minutes, Some(60));
    }

    #[test]
    fn result_makes_a_match_even_with_training_words() {
        let extraction = extract("practice match, we won");
        assert_eq!(extraction.record_kind, RecordKind::Matches);
    }

    #[test]
    fn to_record_copies_fields_and_transcript() {
        let extraction = extract("Won 6-3 6-2 at Padel Center with Luis");
        let record = to_record(&extraction, "2025-03-01");

        assert_eq!(record.date, "2025-03-01");
        assert_eq!(record.outcome(), Some(MatchOutcome::Win));
        assert_eq!(record.text("score"), Some("6-3 6-2"));
        assert_eq!(record.location(), Some("Padel Center"));
        assert_eq!(record.partner(), Some("Luis"));
        assert_eq!(
            record.notes(),
            Some("Won 6-3 6-2 at Padel Center with Luis")
        );
        assert!(record.attributes.get("duration").is_none());
    }
}
