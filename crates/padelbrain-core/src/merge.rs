//! Merge engine combining local and imported collections.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{compare_record_dates, Record, RecordKind};

/// Policy for reconciling a local and a remote collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Keep local records, ignore the import
    UseLocal,
    /// Replace local records with the import
    UseRemote,
    /// Union by id; the later `date` wins for shared ids
    #[default]
    MergeSmart,
    /// Union by id; the local copy wins for shared ids
    KeepBoth,
    /// Append the import to local records without deduplication.
    /// Only reached through an unrecognized strategy name.
    Concatenate,
}

impl MergeStrategy {
    /// Strategies a caller can pick explicitly
    pub const SELECTABLE: [Self; 4] = [
        Self::UseLocal,
        Self::UseRemote,
        Self::MergeSmart,
        Self::KeepBoth,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UseLocal => "use-local",
            Self::UseRemote => "use-remote",
            Self::MergeSmart => "merge-smart",
            Self::KeepBoth => "keep-both",
            Self::Concatenate => "concatenate",
        }
    }

    /// Parse a strategy name, falling back to [`MergeStrategy::Concatenate`]
    /// for anything unrecognized.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!("Unrecognized merge strategy '{name}', concatenating collections");
            Self::Concatenate
        })
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "use-local" | "local" => Ok(Self::UseLocal),
            "use-remote" | "remote" => Ok(Self::UseRemote),
            "merge-smart" | "smart" => Ok(Self::MergeSmart),
            "keep-both" | "both" => Ok(Self::KeepBoth),
            "concatenate" => Ok(Self::Concatenate),
            other => Err(format!("unknown merge strategy '{other}'")),
        }
    }
}

/// Per-collection change counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionTally {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Change counts for both collections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTally {
    pub matches: CollectionTally,
    pub trainings: CollectionTally,
}

impl ChangeTally {
    #[must_use]
    pub const fn get(&self, kind: RecordKind) -> CollectionTally {
        match kind {
            RecordKind::Matches => self.matches,
            RecordKind::Trainings => self.trainings,
        }
    }
}

/// Final collections and what changed to produce them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub matches: Vec<Record>,
    pub trainings: Vec<Record>,
    pub tally: ChangeTally,
}

/// Merge both collections with the same strategy.
#[must_use]
pub fn merge(
    local_matches: &[Record],
    local_trainings: &[Record],
    remote_matches: &[Record],
    remote_trainings: &[Record],
    strategy: MergeStrategy,
) -> MergeResult {
    let (matches, matches_tally) = merge_collection(local_matches, remote_matches, strategy);
    let (trainings, trainings_tally) =
        merge_collection(local_trainings, remote_trainings, strategy);

    tracing::debug!(
        "Merged with {strategy}: matches {matches_tally:?}, trainings {trainings_tally:?}"
    );

    MergeResult {
        matches,
        trainings,
        tally: ChangeTally {
            matches: matches_tally,
            trainings: trainings_tally,
        },
    }
}

/// Merge a single collection.
#[must_use]
pub fn merge_collection(
    local: &[Record],
    remote: &[Record],
    strategy: MergeStrategy,
) -> (Vec<Record>, CollectionTally) {
    let mut tally = CollectionTally::default();

    let merged = match strategy {
        MergeStrategy::UseLocal => {
            tally.skipped = remote.len();
            local.to_vec()
        }
        MergeStrategy::UseRemote => {
            tally.added = remote.len();
            remote.to_vec()
        }
        MergeStrategy::MergeSmart => {
            let mut merged = local.to_vec();
            let mut positions = index_by_id(&merged);

            for record in remote {
                match positions.get(record.id.as_str()).copied() {
                    None => {
                        positions.insert(record.id.clone(), merged.len());
                        merged.push(record.clone());
                        tally.added += 1;
                    }
                    Some(position) => {
                        let current = &merged[position];
                        if compare_record_dates(&record.date, &current.date).is_gt() {
                            merged[position] = record.clone();
                            tally.updated += 1;
                        } else {
                            tally.skipped += 1;
                        }
                    }
                }
            }
            merged
        }
        MergeStrategy::KeepBoth => {
            let mut merged = local.to_vec();
            let mut positions = index_by_id(&merged);

            for record in remote {
                if positions.contains_key(record.id.as_str()) {
                    tally.skipped += 1;
                } else {
                    positions.insert(record.id.clone(), merged.len());
                    merged.push(record.clone());
                    tally.added += 1;
                }
            }
            merged
        }
        MergeStrategy::Concatenate => {
            tally.added = remote.len();
            local.iter().chain(remote).cloned().collect()
        }
    };

    (merged, tally)
}

fn index_by_id(records: &[Record]) -> HashMap<String, usize> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| (record.id.clone(), position))
        .collect()
}
