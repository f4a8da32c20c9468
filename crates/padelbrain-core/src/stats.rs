//! Statistics over match and training collections

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{compare_record_dates, MatchOutcome, Record};

/// Label for records missing the grouping attribute
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Overall totals for one profile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_matches: usize,
    pub total_trainings: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// Percentage of decided (won or lost) matches that were won
    pub win_rate: f64,
    pub current_win_streak: usize,
    pub longest_win_streak: usize,
    pub total_training_minutes: f64,
    /// Mean over trainings that record a duration
    pub average_training_minutes: f64,
}

/// Results for one location or partner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub key: String,
    pub played: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
}

/// Trailing win rate as of one match
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub win_rate: f64,
}

/// Mean self-reported wellness values; `None` when no record carries one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WellnessAverages {
    pub mood: Option<f64>,
    pub energy: Option<f64>,
    pub fatigue: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Outcomes {
    wins: usize,
    losses: usize,
    draws: usize,
}

impl Outcomes {
    fn count<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut outcomes = Self::default();
        for record in records {
            outcomes.add(record.outcome());
        }
        outcomes
    }

    fn add(&mut self, outcome: Option<MatchOutcome>) {
        match outcome {
            Some(MatchOutcome::Win) => self.wins += 1,
            Some(MatchOutcome::Loss) => self.losses += 1,
            Some(MatchOutcome::Draw) => self.draws += 1,
            None => {}
        }
    }

    fn win_rate(self) -> f64 {
        percentage(self.wins, self.wins + self.losses)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn by_date(records: &[Record]) -> Vec<&Record> {
    let mut sorted = records.iter().collect::<Vec<_>>();
    sorted.sort_by(|left, right| compare_record_dates(&left.date, &right.date));
    sorted
}

/// Compute overall totals.
///
/// Streaks follow date order; matches without a result neither extend nor
/// break a streak.
#[must_use]
pub fn summary(matches: &[Record], trainings: &[Record]) -> Summary {
    let outcomes = Outcomes::count(matches);

    let mut current_win_streak = 0;
    let mut longest_win_streak = 0;
    for record in by_date(matches) {
        match record.outcome() {
            Some(MatchOutcome::Win) => {
                current_win_streak += 1;
                longest_win_streak = longest_win_streak.max(current_win_streak);
            }
            Some(MatchOutcome::Loss | MatchOutcome::Draw) => current_win_streak = 0,
            None => {}
        }
    }

    let durations = trainings
        .iter()
        .filter_map(|record| record.number("duration"))
        .filter(|minutes| minutes.is_finite() && *minutes >= 0.0)
        .collect::<Vec<_>>();

    Summary {
        total_matches: matches.len(),
        total_trainings: trainings.len(),
        wins: outcomes.wins,
        losses: outcomes.losses,
        draws: outcomes.draws,
        win_rate: outcomes.win_rate(),
        current_win_streak,
        longest_win_streak,
        total_training_minutes: durations.iter().sum(),
        average_training_minutes: mean(&durations).unwrap_or(0.0),
    }
}

/// Per-location results, most played first
#[must_use]
pub fn group_by_location(matches: &[Record]) -> Vec<GroupStats> {
    group_by(matches, Record::location)
}

/// Per-partner results, most played first
#[must_use]
pub fn group_by_partner(matches: &[Record]) -> Vec<GroupStats> {
    group_by(matches, Record::partner)
}

fn group_by(matches: &[Record], key_of: impl Fn(&Record) -> Option<&str>) -> Vec<GroupStats> {
    let mut groups: BTreeMap<String, (usize, Outcomes)> = BTreeMap::new();
    for record in matches {
        let key = key_of(record).unwrap_or(UNKNOWN_GROUP).to_string();
        let (played, outcomes) = groups.entry(key).or_default();
        *played += 1;
        outcomes.add(record.outcome());
    }

    let mut stats = groups
        .into_iter()
        .map(|(key, (played, outcomes))| GroupStats {
            key,
            played,
            wins: outcomes.wins,
            losses: outcomes.losses,
            win_rate: outcomes.win_rate(),
        })
        .collect::<Vec<_>>();
    stats.sort_by(|a, b| b.played.cmp(&a.played).then_with(|| a.key.cmp(&b.key)));
    stats
}

/// Trailing win rate over `window` matches in date order.
///
/// The first point is emitted once `window` matches have been played.
#[must_use]
pub fn win_rate_trend(matches: &[Record], window: usize) -> Vec<TrendPoint> {
    if window == 0 {
        return Vec::new();
    }

    by_date(matches)
        .windows(window)
        .map(|slice| TrendPoint {
            date: slice[slice.len() - 1].date.clone(),
            win_rate: Outcomes::count(slice.iter().copied()).win_rate(),
        })
        .collect()
}

/// Average `mood`, `energy` and `fatigue` across records
#[must_use]
pub fn wellness_averages(records: &[Record]) -> WellnessAverages {
    let average = |key: &str| {
        let values = records
            .iter()
            .filter_map(|record| record.number(key))
            .filter(|value| value.is_finite())
            .collect::<Vec<_>>();
        mean(&values)
    };

    WellnessAverages {
        mood: average("mood"),
        energy: average("energy"),
        fatigue: average("fatigue"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn played(id: &str, date: &str, result: &str) -> Record {
        Record::with_id(id, date).with_attribute("result", result)
    }

    #[test]
    fn summary_counts_results_and_streaks() {
        let matches = vec![
            played("4", "2025-01-04", "win"),
            played("1", "2025-01-01", "win"),
            played("2", "2025-01-02", "win"),
            played("3", "2025-01-03", "loss"),
            played("5", "2025-01-05", "draw"),
            played("6", "2025-01-06", "win"),
            Record::with_id("7", "2025-01-07"),
        ];

        let stats = summary(&matches, &[]);

        assert_eq!(stats.total_matches, 7);
        assert_eq!((stats.wins, stats.losses, stats.draws), (4, 1, 1));
        assert!((stats.win_rate - 80.0).abs() < f64::EPSILON);
        assert_eq!(stats.longest_win_streak, 2);
        assert_eq!(stats.current_win_streak, 1);
    }

    #[test]
    fn summary_training_minutes() {
        let trainings = vec![
            Record::with_id("t1", "2025-01-01").with_attribute("duration", 60),
            Record::with_id("t2", "2025-01-02").with_attribute("duration", "90"),
            Record::with_id("t3", "2025-01-03"),
        ];

        let stats = summary(&[], &trainings);

        assert_eq!(stats.total_trainings, 3);
        assert!((stats.total_training_minutes - 150.0).abs() < f64::EPSILON);
        assert!((stats.average_training_minutes - 75.0).abs() < f64::EPSILON);
        assert!(stats.win_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn group_by_location_sorts_by_played_then_name() {
        let matches = vec![
            played("1", "2025-01-01", "win").with_attribute("location", "Norte"),
            played("2", "2025-01-02", "loss").with_attribute("location", "Norte"),
            played("3", "2025-01-03", "win").with_attribute("location", "Centro"),
            played("4", "2025-01-04", "win"),
        ];

        let groups = group_by_location(&matches);
        let keys = groups.iter().map(|g| g.key.as_str()).collect::<Vec<_>>();

        assert_eq!(keys, vec!["Norte", "Centro", UNKNOWN_GROUP]);
        assert_eq!(
            (groups[0].played, groups[0].wins, groups[0].losses),
            (2, 1, 1)
        );
        assert!((groups[0].win_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn group_by_partner_uses_partner_attribute() {
        let matches = vec![
            played("1", "2025-01-01", "win").with_attribute("partner", "Luis"),
            played("2", "2025-01-02", "win").with_attribute("partner", "Luis"),
        ];

        let groups = group_by_partner(&matches);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "Luis");
        assert!((groups[0].win_rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn win_rate_trend_uses_trailing_window() {
        let matches = vec![
            played("3", "2025-01-03", "win"),
            played("1", "2025-01-01", "win"),
            played("2", "2025-01-02", "loss"),
            played("4", "2025-01-04", "loss"),
        ];

        let trend = win_rate_trend(&matches, 2);

        let dates = trend.iter().map(|p| p.date.as_str()).collect::<Vec<_>>();
        assert_eq!(dates, vec!["2025-01-02", "2025-01-03", "2025-01-04"]);
        for point in &trend {
            assert!((point.win_rate - 50.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn win_rate_trend_edge_windows() {
        let matches = vec![played("1", "2025-01-01", "win")];
        assert!(win_rate_trend(&matches, 0).is_empty());
        assert!(win_rate_trend(&matches, 2).is_empty());
        assert_eq!(win_rate_trend(&matches, 1).len(), 1);
    }

    #[test]
    fn wellness_averages_skip_missing_values() {
        let records = vec![
            Record::with_id("a", "2025-01-01")
                .with_attribute("mood", 4)
                .with_attribute("energy", 2),
            Record::with_id("b", "2025-01-02").with_attribute("mood", 2),
        ];

        let averages = wellness_averages(&records);

        assert_eq!(averages.mood, Some(3.0));
        assert_eq!(averages.energy, Some(2.0));
        assert_eq!(averages.fatigue, None);
    }
}
