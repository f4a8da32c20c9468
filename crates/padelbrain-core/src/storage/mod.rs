//! Key-value storage abstraction
//!
//! Everything PadelBrain persists is a JSON blob under a namespaced string
//! key. Collections are always read and written whole.

mod memory;
mod retry;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::models::{ProfileId, RecordKind};

pub use memory::MemoryStore;
pub use retry::{RetryPolicy, RetryingStore};

const KEY_PREFIX: &str = "padelbrain";

/// Trait for async key-value storage backends
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Storage keys used by the session
pub mod keys {
    use super::{ProfileId, RecordKind, KEY_PREFIX};

    pub fn device_id() -> String {
        format!("{KEY_PREFIX}:device_id")
    }

    pub fn profiles() -> String {
        format!("{KEY_PREFIX}:profiles")
    }

    pub fn active_profile() -> String {
        format!("{KEY_PREFIX}:active_profile")
    }

    /// Collection blob for one profile
    pub fn collection(profile_id: &ProfileId, kind: RecordKind) -> String {
        format!("{KEY_PREFIX}:{profile_id}:{}", kind.as_str())
    }
}

/// Read and deserialize a JSON value
pub async fn load_json<S, T>(store: &S, key: &str) -> Result<Option<T>>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and store a JSON value in a single write
pub async fn save_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_keys_are_namespaced_per_profile() {
        let id: ProfileId = "0190a5b8-7c2e-7d3f-8a1b-2c3d4e5f6a7b".parse().unwrap();
        assert_eq!(
            keys::collection(&id, RecordKind::Matches),
            "padelbrain:0190a5b8-7c2e-7d3f-8a1b-2c3d4e5f6a7b:matches"
        );
        assert_eq!(
            keys::collection(&id, RecordKind::Trainings),
            "padelbrain:0190a5b8-7c2e-7d3f-8a1b-2c3d4e5f6a7b:trainings"
        );
    }
}
