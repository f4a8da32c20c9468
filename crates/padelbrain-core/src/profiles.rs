//! Profile registry and device identity

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Profile, ProfileId};
use crate::storage::{keys, load_json, save_json, KeyValueStore};

/// Return this device's identifier, generating and persisting one on first use
pub async fn ensure_device_id<S: KeyValueStore>(storage: &S) -> Result<String> {
    let key = keys::device_id();
    if let Some(existing) = storage.get(&key).await? {
        let existing = existing.trim().to_string();
        if !existing.is_empty() {
            return Ok(existing);
        }
    }

    let device_id = Uuid::now_v7().to_string();
    storage.set(&key, &device_id).await?;
    tracing::info!("Registered new device id {device_id}");
    Ok(device_id)
}

/// All known profiles plus the active-profile pointer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRegistry {
    profiles: Vec<Profile>,
    active: Option<ProfileId>,
}

impl ProfileRegistry {
    /// Load the registry; a dangling active pointer is dropped
    pub async fn load<S: KeyValueStore>(storage: &S) -> Result<Self> {
        let profiles: Vec<Profile> = load_json(storage, &keys::profiles())
            .await?
            .unwrap_or_default();
        let active = storage
            .get(&keys::active_profile())
            .await?
            .and_then(|raw| raw.parse::<ProfileId>().ok())
            .filter(|id| profiles.iter().any(|profile| profile.id == *id));

        Ok(Self { profiles, active })
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub const fn active_id(&self) -> Option<&ProfileId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&Profile> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == *id)
    }

    pub fn contains(&self, id: &ProfileId) -> bool {
        self.get(id).is_some()
    }

    /// Find a profile by full id, unique id prefix or case-insensitive name
    pub fn resolve(&self, query: &str) -> Result<&Profile> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput(
                "Profile name or id cannot be empty".into(),
            ));
        }

        if let Ok(id) = query.parse::<ProfileId>() {
            if let Some(profile) = self.get(&id) {
                return Ok(profile);
            }
        }

        let by_name = self
            .profiles
            .iter()
            .filter(|profile| profile.name.eq_ignore_ascii_case(query))
            .collect::<Vec<_>>();
        if let [profile] = by_name.as_slice() {
            return Ok(*profile);
        }

        let lowered = query.to_ascii_lowercase();
        let by_prefix = self
            .profiles
            .iter()
            .filter(|profile| profile.id.as_str().starts_with(&lowered))
            .collect::<Vec<_>>();

        match (by_name.len(), by_prefix.as_slice()) {
            (0, [profile]) => Ok(*profile),
            (0, []) => Err(Error::NotFound(format!("profile '{query}'"))),
            _ => Err(Error::InvalidInput(format!(
                "Profile '{query}' is ambiguous; use the full profile id"
            ))),
        }
    }

    /// Add a profile and persist the registry
    pub async fn insert<S: KeyValueStore>(&mut self, storage: &S, profile: Profile) -> Result<()> {
        if self.contains(&profile.id) {
            return Err(Error::InvalidInput(format!(
                "Profile {} already exists",
                profile.id
            )));
        }

        let mut profiles = self.profiles.clone();
        profiles.push(profile);
        save_json(storage, &keys::profiles(), &profiles).await?;
        self.profiles = profiles;
        Ok(())
    }

    /// Replace a stored profile (matched by id) and persist the registry
    pub async fn update<S: KeyValueStore>(&mut self, storage: &S, profile: Profile) -> Result<()> {
        let mut profiles = self.profiles.clone();
        let slot = profiles
            .iter_mut()
            .find(|existing| existing.id == profile.id)
            .ok_or_else(|| Error::NotFound(format!("profile {}", profile.id)))?;
        *slot = profile;
        save_json(storage, &keys::profiles(), &profiles).await?;
        self.profiles = profiles;
        Ok(())
    }

    /// Remove a profile and persist the registry, returning it
    pub async fn remove<S: KeyValueStore>(
        &mut self,
        storage: &S,
        id: &ProfileId,
    ) -> Result<Profile> {
        let mut profiles = self.profiles.clone();
        let position = profiles
            .iter()
            .position(|profile| profile.id == *id)
            .ok_or_else(|| Error::NotFound(format!("profile {id}")))?;
        let removed = profiles.remove(position);
        save_json(storage, &keys::profiles(), &profiles).await?;
        self.profiles = profiles;
        Ok(removed)
    }

    /// Point the registry at another profile (or none) and persist the pointer
    pub async fn set_active<S: KeyValueStore>(
        &mut self,
        storage: &S,
        id: Option<ProfileId>,
    ) -> Result<()> {
        match id {
            Some(id) => {
                if !self.contains(&id) {
                    return Err(Error::NotFound(format!("profile {id}")));
                }
                storage.set(&keys::active_profile(), &id.as_str()).await?;
            }
            None => storage.remove(&keys::active_profile()).await?,
        }
        self.active = id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn named(name: &str) -> Profile {
        Profile::new(name)
    }

    #[tokio::test]
    async fn test_device_id_is_stable() {
        let storage = MemoryStore::new();
        let first = ensure_device_id(&storage).await.unwrap();
        let second = ensure_device_id(&storage).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_insert_activate_and_reload() {
        let storage = MemoryStore::new();
        let mut registry = ProfileRegistry::load(&storage).await.unwrap();
        let profile = named("Ana");

        registry.insert(&storage, profile.clone()).await.unwrap();
        registry
            .set_active(&storage, Some(profile.id))
            .await
            .unwrap();

        let reloaded = ProfileRegistry::load(&storage).await.unwrap();
        assert_eq!(reloaded.profiles(), &[profile.clone()]);
        assert_eq!(reloaded.active(), Some(&profile));
    }

    #[tokio::test]
    async fn test_dangling_active_pointer_is_ignored() {
        let storage = MemoryStore::new();
        storage
            .set(&keys::active_profile(), &ProfileId::new().as_str())
            .await
            .unwrap();

        let registry = ProfileRegistry::load(&storage).await.unwrap();
        assert!(registry.active().is_none());
    }

    #[tokio::test]
    async fn test_set_active_unknown_profile_fails() {
        let storage = MemoryStore::new();
        let mut registry = ProfileRegistry::default();

        let result = registry.set_active(&storage, Some(ProfileId::new())).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_by_id_name_and_prefix() {
        let storage = MemoryStore::new();
        let mut registry = ProfileRegistry::default();
        let ana = named("Ana");
        let luis = named("Luis");
        registry.insert(&storage, ana.clone()).await.unwrap();
        registry.insert(&storage, luis.clone()).await.unwrap();

        assert_eq!(registry.resolve(&ana.id.as_str()).unwrap().id, ana.id);
        assert_eq!(registry.resolve("luis").unwrap().id, luis.id);
        assert!(matches!(
            registry.resolve("nobody"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            registry.resolve("  "),
            Err(Error::InvalidInput(_))
        ));

        let full = luis.id.as_str();
        let prefix = &full[..full.len() - 4];
        assert_eq!(registry.resolve(prefix).unwrap().id, luis.id);
    }

    #[tokio::test]
    async fn test_remove_profile() {
        let storage = MemoryStore::new();
        let mut registry = ProfileRegistry::default();
        let ana = named("Ana");
        registry.insert(&storage, ana.clone()).await.unwrap();

        let removed = registry.remove(&storage, &ana.id).await.unwrap();
        assert_eq!(removed.id, ana.id);
        assert!(registry.profiles().is_empty());
        assert!(matches!(
            registry.remove(&storage, &ana.id).await,
            Err(Error::NotFound(_))
        ));
    }
}
