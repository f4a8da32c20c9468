//! Record store for the active profile.
//!
//! Each collection is persisted as one JSON array. Every mutation builds the
//! new collection, writes it in a single storage call and only then replaces
//! the in-memory copy, so a failed write leaves the store untouched.

use crate::error::{Error, Result};
use crate::models::{compare_record_dates, parse_record_date, ProfileId, Record, RecordKind};
use crate::storage::{keys, load_json, save_json, KeyValueStore};

/// Canonical match and training collections of one profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    profile_id: Option<ProfileId>,
    matches: Vec<Record>,
    trainings: Vec<Record>,
}

impl RecordStore {
    /// Store with no profile loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Empty collections bound to a profile that has nothing stored yet
    pub fn for_profile(profile_id: ProfileId) -> Self {
        Self {
            profile_id: Some(profile_id),
            ..Self::default()
        }
    }

    /// Load both collections of a profile; missing collections are empty
    pub async fn load<S: KeyValueStore>(storage: &S, profile_id: ProfileId) -> Result<Self> {
        let key = keys::collection(&profile_id, RecordKind::Matches);
        let matches = load_json(storage, &key).await?.unwrap_or_default();
        let key = keys::collection(&profile_id, RecordKind::Trainings);
        let trainings = load_json(storage, &key).await?.unwrap_or_default();

        Ok(Self {
            profile_id: Some(profile_id),
            matches,
            trainings,
        })
    }

    pub const fn profile_id(&self) -> Option<&ProfileId> {
        self.profile_id.as_ref()
    }

    pub fn matches(&self) -> &[Record] {
        &self.matches
    }

    pub fn trainings(&self) -> &[Record] {
        &self.trainings
    }

    pub fn records(&self, kind: RecordKind) -> &[Record] {
        match kind {
            RecordKind::Matches => &self.matches,
            RecordKind::Trainings => &self.trainings,
        }
    }

    /// Records of a kind, newest first
    pub fn recent(&self, kind: RecordKind, limit: usize) -> Vec<&Record> {
        let mut records = self.records(kind).iter().collect::<Vec<_>>();
        records.sort_by(|a, b| compare_record_dates(&b.date, &a.date));
        records.truncate(limit);
        records
    }

    pub fn find(&self, kind: RecordKind, id: &str) -> Option<&Record> {
        self.records(kind).iter().find(|record| record.id == id)
    }

    /// Append a new record
    pub async fn add<S: KeyValueStore>(
        &mut self,
        storage: &S,
        kind: RecordKind,
        record: Record,
    ) -> Result<()> {
        validate_record(&record)?;
        if self.find(kind, &record.id).is_some() {
            return Err(Error::DuplicateRecord(record.id));
        }

        let mut updated = self.records(kind).to_vec();
        updated.push(record);
        self.write(storage, kind, updated).await
    }

    /// Replace the record with the same id
    pub async fn update<S: KeyValueStore>(
        &mut self,
        storage: &S,
        kind: RecordKind,
        record: Record,
    ) -> Result<()> {
        validate_record(&record)?;
        let mut updated = self.records(kind).to_vec();
        let slot = updated
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or_else(|| Error::NotFound(format!("{kind} record {}", record.id)))?;
        *slot = record;
        self.write(storage, kind, updated).await
    }

    /// Remove a record by id, returning it
    pub async fn remove<S: KeyValueStore>(
        &mut self,
        storage: &S,
        kind: RecordKind,
        id: &str,
    ) -> Result<Record> {
        let mut updated = self.records(kind).to_vec();
        let position = updated
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| Error::NotFound(format!("{kind} record {id}")))?;
        let removed = updated.remove(position);
        self.write(storage, kind, updated).await?;
        Ok(removed)
    }

    /// Replace both collections wholesale
    pub async fn replace<S: KeyValueStore>(
        &mut self,
        storage: &S,
        matches: Vec<Record>,
        trainings: Vec<Record>,
    ) -> Result<()> {
        self.write(storage, RecordKind::Matches, matches).await?;
        self.write(storage, RecordKind::Trainings, trainings).await
    }

    async fn write<S: KeyValueStore>(
        &mut self,
        storage: &S,
        kind: RecordKind,
        records: Vec<Record>,
    ) -> Result<()> {
        let profile_id = self.profile_id.ok_or(Error::NoActiveProfile)?;
        let key = keys::collection(&profile_id, kind);
        save_json(storage, &key, &records).await?;
        tracing::debug!(
            "Persisted {} {kind} for profile {profile_id}",
            records.len()
        );

        match kind {
            RecordKind::Matches => self.matches = records,
            RecordKind::Trainings => self.trainings = records,
        }
        Ok(())
    }
}

fn validate_record(record: &Record) -> Result<()> {
    if record.id.trim().is_empty() {
        return Err(Error::InvalidInput("Record id cannot be empty".into()));
    }
    if parse_record_date(&record.date).is_none() {
        return Err(Error::InvalidInput(format!(
            "Record date '{}' is not a valid date",
            record.date
        )));
    }
    Ok(())
}
