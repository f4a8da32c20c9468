//! Application session: profiles, records and the import flow.
//!
//! A [`Session`] owns the storage backend, the profile registry and the
//! record store of the active profile. Importing a backup moves through
//! [`ImportPhase`]s in order and always ends back in [`ImportPhase::Idle`],
//! whether it succeeded, failed or was cancelled.

use chrono::Utc;
use serde::Serialize;

use crate::backup::{self, BackupDocument};
use crate::conflict::{self, ConflictDescriptor};
use crate::error::{Error, Result};
use crate::merge::{self, ChangeTally, CollectionTally, MergeStrategy};
use crate::models::{Profile, ProfileId, Record, RecordKind};
use crate::profiles::{ensure_device_id, ProfileRegistry};
use crate::records::RecordStore;
use crate::storage::{keys, KeyValueStore};

/// Where an import currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    #[default]
    Idle,
    Decoding,
    Detecting,
    AwaitingStrategyChoice,
    Merging,
    Persisting,
}

/// Summary of a finished import
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub profile_id: ProfileId,
    pub profile_name: String,
    pub strategy: MergeStrategy,
    /// The backup introduced a profile unknown to this device
    pub new_profile: bool,
    /// The active profile changed as part of the import
    pub switched_profile: bool,
    pub tally: ChangeTally,
    pub conflicts: Vec<ConflictDescriptor>,
}

/// An import waiting for the caller to choose a merge strategy
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImport {
    document: BackupDocument,
    conflicts: Vec<ConflictDescriptor>,
}

impl PendingImport {
    pub const fn document(&self) -> &BackupDocument {
        &self.document
    }

    pub fn conflicts(&self) -> &[ConflictDescriptor] {
        &self.conflicts
    }
}

/// Result of [`Session::begin_import`]
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Completed(ImportReport),
    NeedsStrategy(PendingImport),
}

/// Explicit application state over one storage backend
pub struct Session<S: KeyValueStore> {
    storage: S,
    device_id: String,
    profiles: ProfileRegistry,
    records: RecordStore,
    phase: ImportPhase,
    expected_profile: Option<ProfileId>,
}

impl<S: KeyValueStore> Session<S> {
    /// Load device identity, profiles and the active profile's records
    pub async fn open(storage: S) -> Result<Self> {
        let device_id = ensure_device_id(&storage).await?;
        let profiles = ProfileRegistry::load(&storage).await?;
        let records = match profiles.active_id() {
            Some(id) => RecordStore::load(&storage, *id).await?,
            None => RecordStore::empty(),
        };

        tracing::debug!(
            "Opened session with {} profiles on device {device_id}",
            profiles.profiles().len()
        );

        Ok(Self {
            storage,
            device_id,
            profiles,
            records,
            phase: ImportPhase::Idle,
            expected_profile: None,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub const fn phase(&self) -> ImportPhase {
        self.phase
    }

    pub const fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn list_profiles(&self) -> &[Profile] {
        self.profiles.profiles()
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.profiles.active()
    }

    pub fn resolve_profile(&self, query: &str) -> Result<&Profile> {
        self.profiles.resolve(query)
    }

    /// Require imports to carry this profile id; `None` accepts any backup
    pub fn set_expected_profile(&mut self, expected: Option<ProfileId>) {
        self.expected_profile = expected;
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    /// Create a profile owned by this device. The first profile becomes active.
    pub async fn create_profile(
        &mut self,
        name: &str,
        email: Option<String>,
        avatar: Option<String>,
    ) -> Result<Profile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Profile name cannot be empty".into()));
        }

        let mut profile = Profile::new(name);
        profile.email = email.filter(|value| !value.trim().is_empty());
        profile.avatar = avatar.filter(|value| !value.trim().is_empty());
        profile.device_id = Some(self.device_id.clone());

        self.profiles.insert(&self.storage, profile.clone()).await?;
        tracing::info!("Created profile {} ({})", profile.name, profile.short_id());

        if self.profiles.active_id().is_none() {
            self.switch_profile(&profile.id).await?;
        }
        Ok(profile)
    }

    /// Make another profile active and load its collections
    pub async fn switch_profile(&mut self, id: &ProfileId) -> Result<&Profile> {
        if !self.profiles.contains(id) {
            return Err(Error::NotFound(format!("profile {id}")));
        }

        let records = RecordStore::load(&self.storage, *id).await?;
        self.profiles.set_active(&self.storage, Some(*id)).await?;
        self.records = records;
        tracing::info!("Switched to profile {id}");

        self.profiles
            .active()
            .ok_or_else(|| Error::NotFound(format!("profile {id}")))
    }

    /// Persist edited profile fields
    pub async fn update_profile(&mut self, profile: Profile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(Error::InvalidInput("Profile name cannot be empty".into()));
        }
        self.profiles.update(&self.storage, profile).await
    }

    /// Delete a profile and both of its collections.
    ///
    /// Deleting the active profile activates the first remaining one, or
    /// leaves the session without an active profile.
    pub async fn delete_profile(&mut self, id: &ProfileId) -> Result<Profile> {
        if !self.profiles.contains(id) {
            return Err(Error::NotFound(format!("profile {id}")));
        }

        for kind in RecordKind::ALL {
            self.storage.remove(&keys::collection(id, kind)).await?;
        }
        let removed = self.profiles.remove(&self.storage, id).await?;
        tracing::info!("Deleted profile {} ({})", removed.name, removed.short_id());

        if self.profiles.active_id() == Some(id) {
            let next = self.profiles.profiles().first().map(|profile| profile.id);
            match next {
                Some(next) => {
                    self.switch_profile(&next).await?;
                }
                None => {
                    self.profiles.set_active(&self.storage, None).await?;
                    self.records = RecordStore::empty();
                }
            }
        }

        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Records of the active profile
    // -----------------------------------------------------------------------

    pub async fn add_record(&mut self, kind: RecordKind, record: Record) -> Result<()> {
        self.records.add(&self.storage, kind, record).await
    }

    pub async fn update_record(&mut self, kind: RecordKind, record: Record) -> Result<()> {
        self.records.update(&self.storage, kind, record).await
    }

    pub async fn remove_record(&mut self, kind: RecordKind, id: &str) -> Result<Record> {
        self.records.remove(&self.storage, kind, id).await
    }

    /// Backup document for the active profile
    pub fn export_active(&self) -> Result<BackupDocument> {
        let profile = self.profiles.active().ok_or(Error::NoActiveProfile)?;
        Ok(backup::export_backup(
            self.records.matches(),
            self.records.trainings(),
            profile,
        ))
    }

    // -----------------------------------------------------------------------
    // Import
    // -----------------------------------------------------------------------

    /// Compare a backup with the local data of the same profile.
    ///
    /// Returns `None` when the profile is unknown here or when neither
    /// collection differs. Fails with [`Error::ProfileMismatch`] when the
    /// backup belongs to another profile than the expected one.
    pub async fn detect_only(
        &self,
        document: &BackupDocument,
    ) -> Result<Option<Vec<ConflictDescriptor>>> {
        self.check_expected(&document.user)?;
        let profile_id = document.user.id;
        if !self.profiles.contains(&profile_id) {
            return Ok(None);
        }

        let loaded;
        let local = if self.records.profile_id() == Some(&profile_id) {
            &self.records
        } else {
            loaded = RecordStore::load(&self.storage, profile_id).await?;
            &loaded
        };

        let conflicts = conflict::detect_all(
            local.matches(),
            local.trainings(),
            &document.matches,
            &document.trainings,
        );
        Ok((!conflicts.is_empty()).then_some(conflicts))
    }

    /// Import a decoded backup with the given strategy, skipping the
    /// strategy prompt.
    pub async fn apply_strategy(
        &mut self,
        document: BackupDocument,
        strategy: MergeStrategy,
    ) -> Result<ImportReport> {
        let result = self.apply_document(document, strategy).await;
        self.finish(result)
    }

    /// Decode backup text and import it when no decision is needed.
    ///
    /// Unknown profiles and conflict-free backups complete immediately.
    /// Otherwise the caller gets a [`PendingImport`] to pass to
    /// [`Session::resolve_import`] or [`Session::cancel_import`].
    pub async fn begin_import(&mut self, text: &str) -> Result<ImportOutcome> {
        match self.start_import(text).await {
            Ok(ImportOutcome::Completed(report)) => {
                self.finish(Ok(report)).map(ImportOutcome::Completed)
            }
            Err(error) => self.finish(Err(error)).map(ImportOutcome::Completed),
            pending => pending,
        }
    }

    /// Finish a pending import with the chosen strategy
    pub async fn resolve_import(
        &mut self,
        pending: PendingImport,
        strategy: MergeStrategy,
    ) -> Result<ImportReport> {
        let PendingImport {
            document,
            conflicts,
        } = pending;
        let result = self.commit(document, strategy, conflicts).await;
        self.finish(result)
    }

    /// Drop a pending import without persisting anything
    pub fn cancel_import(&mut self, pending: PendingImport) {
        tracing::info!(
            "Cancelled import of profile {} with {} conflicting collections",
            pending.document.user.id,
            pending.conflicts.len()
        );
        self.set_phase(ImportPhase::Idle);
    }

    async fn start_import(&mut self, text: &str) -> Result<ImportOutcome> {
        self.set_phase(ImportPhase::Decoding);
        let document = backup::decode(text)?;
        self.check_expected(&document.user)?;

        if !self.profiles.contains(&document.user.id) {
            return self
                .import_new_profile(document)
                .await
                .map(ImportOutcome::Completed);
        }

        self.set_phase(ImportPhase::Detecting);
        match self.detect_only(&document).await? {
            None => self
                .commit(document, MergeStrategy::MergeSmart, Vec::new())
                .await
                .map(ImportOutcome::Completed),
            Some(conflicts) => {
                self.set_phase(ImportPhase::AwaitingStrategyChoice);
                Ok(ImportOutcome::NeedsStrategy(PendingImport {
                    document,
                    conflicts,
                }))
            }
        }
    }

    async fn apply_document(
        &mut self,
        document: BackupDocument,
        strategy: MergeStrategy,
    ) -> Result<ImportReport> {
        self.check_expected(&document.user)?;

        if !self.profiles.contains(&document.user.id) {
            return self.import_new_profile(document).await;
        }

        self.set_phase(ImportPhase::Detecting);
        let conflicts = self.detect_only(&document).await?.unwrap_or_default();
        self.commit(document, strategy, conflicts).await
    }

    /// Merge into a known profile and persist, switching to it first
    async fn commit(
        &mut self,
        document: BackupDocument,
        strategy: MergeStrategy,
        conflicts: Vec<ConflictDescriptor>,
    ) -> Result<ImportReport> {
        let profile_id = document.user.id;
        if !self.profiles.contains(&profile_id) {
            return self.import_new_profile(document).await;
        }

        let switched_profile = self.profiles.active_id() != Some(&profile_id);
        if switched_profile {
            self.switch_profile(&profile_id).await?;
        }

        self.set_phase(ImportPhase::Merging);
        let merged = merge::merge(
            self.records.matches(),
            self.records.trainings(),
            &document.matches,
            &document.trainings,
            strategy,
        );

        self.set_phase(ImportPhase::Persisting);
        self.records
            .replace(&self.storage, merged.matches, merged.trainings)
            .await?;
        let profile = self.touch_last_sync(&profile_id).await?;

        Ok(ImportReport {
            profile_id,
            profile_name: profile.name,
            strategy,
            new_profile: false,
            switched_profile,
            tally: merged.tally,
            conflicts,
        })
    }

    /// Register an unknown profile and take the backup's collections as-is.
    ///
    /// Collections are written before the profile is registered, so a failed
    /// write never leaves a registered profile without its data.
    async fn import_new_profile(&mut self, document: BackupDocument) -> Result<ImportReport> {
        let BackupDocument {
            mut user,
            matches,
            trainings,
            ..
        } = document;

        self.set_phase(ImportPhase::Persisting);
        let profile_id = user.id;
        let profile_name = user.name.clone();
        let tally = ChangeTally {
            matches: CollectionTally {
                added: matches.len(),
                ..CollectionTally::default()
            },
            trainings: CollectionTally {
                added: trainings.len(),
                ..CollectionTally::default()
            },
        };

        let mut records = RecordStore::for_profile(profile_id);
        if let Err(error) = records.replace(&self.storage, matches, trainings).await {
            self.discard_collections(&profile_id).await;
            return Err(error);
        }

        user.last_sync_at = Some(Utc::now());
        if let Err(error) = self.profiles.insert(&self.storage, user).await {
            self.discard_collections(&profile_id).await;
            return Err(error);
        }
        self.profiles
            .set_active(&self.storage, Some(profile_id))
            .await?;
        self.records = records;
        tracing::info!("Switched to profile {profile_id}");

        Ok(ImportReport {
            profile_id,
            profile_name,
            strategy: MergeStrategy::UseRemote,
            new_profile: true,
            switched_profile: true,
            tally,
            conflicts: Vec::new(),
        })
    }

    /// Best-effort removal of collections written for a profile that never
    /// got registered
    async fn discard_collections(&self, profile_id: &ProfileId) {
        for kind in RecordKind::ALL {
            let key = keys::collection(profile_id, kind);
            if let Err(error) = self.storage.remove(&key).await {
                tracing::warn!("Could not discard {kind} of profile {profile_id}: {error}");
            }
        }
    }

    async fn touch_last_sync(&mut self, id: &ProfileId) -> Result<Profile> {
        let mut profile = self
            .profiles
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("profile {id}")))?;
        profile.last_sync_at = Some(Utc::now());
        self.profiles.update(&self.storage, profile.clone()).await?;
        Ok(profile)
    }

    fn check_expected(&self, user: &Profile) -> Result<()> {
        match self.expected_profile {
            Some(expected) if expected != user.id => Err(Error::ProfileMismatch {
                expected: expected.to_string(),
                found: user.id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn finish(&mut self, result: Result<ImportReport>) -> Result<ImportReport> {
        match &result {
            Ok(report) => tracing::info!(
                "Imported profile {} with {}: matches {:?}, trainings {:?}",
                report.profile_id,
                report.strategy,
                report.tally.matches,
                report.tally.trainings
            ),
            Err(error) => tracing::warn!("Import failed during {:?}: {error}", self.phase),
        }
        self.set_phase(ImportPhase::Idle);
        result
    }

    fn set_phase(&mut self, phase: ImportPhase) {
        if self.phase != phase {
            tracing::debug!("Import phase {:?} -> {phase:?}", self.phase);
            self.phase = phase;
        }
    }
}
