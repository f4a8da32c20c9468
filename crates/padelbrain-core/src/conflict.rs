//! Conflict detection between a local and an imported record collection.

use std::collections::{BTreeSet, HashMap};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{compare_record_dates, Record, RecordKind};

/// Summary of one side of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub count: usize,
    /// Most recent record date, or the detection time for an empty collection
    pub last_modified: String,
    pub ids: Vec<String>,
}

impl CollectionSummary {
    fn of(records: &[Record]) -> Self {
        let last_modified = records
            .iter()
            .max_by(|left, right| compare_record_dates(&left.date, &right.date))
            .map_or_else(
                || Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                |record| record.date.clone(),
            );

        Self {
            count: records.len(),
            last_modified,
            ids: records.iter().map(|record| record.id.clone()).collect(),
        }
    }
}

/// Difference between the local and remote version of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDescriptor {
    pub kind: RecordKind,
    pub local: CollectionSummary,
    pub remote: CollectionSummary,
    /// Ids present only on this device
    pub only_in_local: Vec<String>,
    /// Ids present only in the import
    pub only_in_remote: Vec<String>,
    /// Ids on both sides whose `date` differs
    pub modified: Vec<String>,
}

impl ConflictDescriptor {
    /// Number of ids that differ in any way
    #[must_use]
    pub fn total_differences(&self) -> usize {
        self.only_in_local.len() + self.only_in_remote.len() + self.modified.len()
    }
}

/// Compare two collections of the same kind.
///
/// Returns `None` when both sides hold the same ids with the same dates.
/// Records sharing an id count as modified only when their `date` points at
/// a different instant; other attribute changes are not inspected.
#[must_use]
pub fn detect(kind: RecordKind, local: &[Record], remote: &[Record]) -> Option<ConflictDescriptor> {
    let local_dates: HashMap<&str, &str> = local
        .iter()
        .map(|record| (record.id.as_str(), record.date.as_str()))
        .collect();
    let remote_dates: HashMap<&str, &str> = remote
        .iter()
        .map(|record| (record.id.as_str(), record.date.as_str()))
        .collect();

    let only_in_local = sorted_ids(
        local_dates
            .keys()
            .copied()
            .filter(|id| !remote_dates.contains_key(id)),
    );
    let only_in_remote = sorted_ids(
        remote_dates
            .keys()
            .copied()
            .filter(|id| !local_dates.contains_key(id)),
    );
    let modified = sorted_ids(
        local_dates
            .iter()
            .filter(|(id, local_date)| {
                remote_dates.get(*id).is_some_and(|remote_date| {
                    compare_record_dates(remote_date, local_date).is_ne()
                })
            })
            .map(|(id, _)| *id),
    );

    if only_in_local.is_empty() && only_in_remote.is_empty() && modified.is_empty() {
        return None;
    }

    Some(ConflictDescriptor {
        kind,
        local: CollectionSummary::of(local),
        remote: CollectionSummary::of(remote),
        only_in_local,
        only_in_remote,
        modified,
    })
}

/// Run [`detect`] for both collections, keeping only those that differ.
#[must_use]
pub fn detect_all(
    local_matches: &[Record],
    local_trainings: &[Record],
    remote_matches: &[Record],
    remote_trainings: &[Record],
) -> Vec<ConflictDescriptor> {
    [
        detect(RecordKind::Matches, local_matches, remote_matches),
        detect(RecordKind::Trainings, local_trainings, remote_trainings),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn sorted_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    ids.map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, date: &str) -> Record {
        Record::with_id(id, date)
    }

    #[test]
    fn identical_collections_have_no_conflict() {
        let local = vec![record("a", "2025-01-01"), record("b", "2025-01-02")];
        let remote = local.clone();

        assert_eq!(detect(RecordKind::Matches, &local, &remote), None);
    }

    #[test]
    fn same_ids_in_different_order_have_no_conflict() {
        let local = vec![record("a", "2025-01-01"), record("b", "2025-01-02")];
        let remote = vec![record("b", "2025-01-02"), record("a", "2025-01-01")];

        assert_eq!(detect(RecordKind::Matches, &local, &remote), None);
    }

    #[test]
    fn content_change_with_same_date_is_not_detected() {
        let local = vec![record("a", "2025-01-01").with_attribute("notes", "old")];
        let remote = vec![record("a", "2025-01-01").with_attribute("notes", "new")];

        assert_eq!(detect(RecordKind::Trainings, &local, &remote), None);
    }

    #[test]
    fn same_instant_with_different_offsets_is_not_modified() {
        let local = vec![record("a", "2025-01-01T10:00:00Z")];
        let remote = vec![record("a", "2025-01-01T12:00:00+02:00")];

        assert_eq!(detect(RecordKind::Matches, &local, &remote), None);
    }

    #[test]
    fn detects_all_three_sets() {
        let local = vec![
            record("a", "2025-01-01"),
            record("c", "2025-01-03"),
            record("shared", "2025-01-04"),
        ];
        let remote = vec![
            record("a", "2025-01-05"),
            record("b", "2025-01-02"),
            record("shared", "2025-01-04"),
        ];

        let conflict = detect(RecordKind::Matches, &local, &remote).unwrap();

        assert_eq!(conflict.kind, RecordKind::Matches);
        assert_eq!(conflict.only_in_local, vec!["c"]);
        assert_eq!(conflict.only_in_remote, vec!["b"]);
        assert_eq!(conflict.modified, vec!["a"]);
        assert_eq!(conflict.total_differences(), 3);
        assert_eq!(conflict.local.count, 3);
        assert_eq!(conflict.local.last_modified, "2025-01-04");
        assert_eq!(conflict.remote.last_modified, "2025-01-05");
        assert_eq!(conflict.remote.ids, vec!["a", "b", "shared"]);
    }

    #[test]
    fn sets_are_disjoint_and_sized_by_symmetric_difference() {
        let local = vec![
            record("1", "2025-01-01"),
            record("2", "2025-01-02"),
            record("3", "2025-01-03"),
        ];
        let remote = vec![
            record("2", "2025-02-02"),
            record("3", "2025-01-03"),
            record("4", "2025-01-04"),
            record("5", "2025-01-05"),
        ];

        let conflict = detect(RecordKind::Matches, &local, &remote).unwrap();
        let mut all = conflict.only_in_local.clone();
        all.extend(conflict.only_in_remote.clone());
        all.extend(conflict.modified.clone());
        let unique = all.iter().collect::<BTreeSet<_>>();

        assert_eq!(unique.len(), all.len());
        // |{1} ∪ {4, 5}| + |{2}|
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn empty_local_summary_falls_back_to_now() {
        let remote = vec![record("x", "2025-02-01")];

        let conflict = detect(RecordKind::Trainings, &[], &remote).unwrap();

        assert_eq!(conflict.local.count, 0);
        let last_modified = &conflict.local.last_modified;
        assert!(crate::models::parse_record_date(last_modified).is_some());
        assert_eq!(conflict.only_in_remote, vec!["x"]);
    }

    #[test]
    fn detect_all_skips_unchanged_collections() {
        let matches = vec![record("a", "2025-01-01")];
        let trainings = vec![record("t", "2025-01-01")];
        let remote_trainings = vec![record("t", "2025-01-02")];

        let conflicts = detect_all(&matches, &trainings, &matches, &remote_trainings);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, RecordKind::Trainings);
        assert_eq!(conflicts[0].modified, vec!["t"]);
    }
}
