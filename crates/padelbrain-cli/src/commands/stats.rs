use std::path::Path;

use padelbrain_core::stats::{
    group_by_location, group_by_partner, summary, wellness_averages, win_rate_trend, GroupStats,
    Summary, TrendPoint, WellnessAverages,
};
use padelbrain_core::Record;
use serde::Serialize;

use crate::commands::common::open_session;
use crate::error::CliError;

const TOP_GROUPS: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub summary: Summary,
    pub by_location: Vec<GroupStats>,
    pub by_partner: Vec<GroupStats>,
    pub trend: Vec<TrendPoint>,
    pub wellness: WellnessAverages,
}

pub async fn run_stats(
    window: usize,
    as_json: bool,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let session = open_session(db_path, profile).await?;
    let records = session.records();
    let report = build_stats_report(records.matches(), records.trainings(), window);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_stats_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn build_stats_report(matches: &[Record], trainings: &[Record], window: usize) -> StatsReport {
    let all_records = matches.iter().chain(trainings).cloned().collect::<Vec<_>>();

    StatsReport {
        summary: summary(matches, trainings),
        by_location: group_by_location(matches),
        by_partner: group_by_partner(matches),
        trend: win_rate_trend(matches, window),
        wellness: wellness_averages(&all_records),
    }
}

pub fn format_stats_lines(report: &StatsReport) -> Vec<String> {
    let summary = &report.summary;
    let mut lines = vec![
        format!(
            "Matches:   {} ({} W / {} L / {} D), win rate {:.1}%",
            summary.total_matches, summary.wins, summary.losses, summary.draws, summary.win_rate
        ),
        format!(
            "Streaks:   current {}, longest {}",
            summary.current_win_streak, summary.longest_win_streak
        ),
        format!(
            "Trainings: {} ({:.0} min total, {:.0} min average)",
            summary.total_trainings,
            summary.total_training_minutes,
            summary.average_training_minutes
        ),
    ];

    let groupings = [
        ("Locations", &report.by_location),
        ("Partners", &report.by_partner),
    ];
    for (title, groups) in groupings {
        if groups.is_empty() {
            continue;
        }
        lines.push(format!("{title}:"));
        lines.extend(groups.iter().take(TOP_GROUPS).map(|group| {
            format!(
                "  {:<20} {} played, {:.1}% won",
                group.key, group.played, group.win_rate
            )
        }));
    }

    if let Some(latest) = report.trend.last() {
        lines.push(format!(
            "Recent form: {:.1}% over the last window (as of {})",
            latest.win_rate, latest.date
        ));
    }

    let wellness = [
        ("mood", report.wellness.mood),
        ("energy", report.wellness.energy),
        ("fatigue", report.wellness.fatigue),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|value| format!("{name} {value:.1}")))
    .collect::<Vec<_>>();
    if !wellness.is_empty() {
        lines.push(format!("Wellness:  {}", wellness.join(", ")));
    }

    lines
}
