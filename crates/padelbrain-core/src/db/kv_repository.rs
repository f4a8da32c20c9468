//! libSQL-backed key-value store

use crate::error::Result;
use crate::storage::KeyValueStore;

use super::Database;

/// libSQL implementation of `KeyValueStore`
pub struct LibSqlKeyValueStore {
    db: Database,
}

impl LibSqlKeyValueStore {
    /// Create a store on top of an opened database
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl KeyValueStore for LibSqlKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .db
            .connection()
            .query("SELECT value FROM kv_store WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.db
            .connection()
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                libsql::params![key, value, now],
            )
            .await?;
        tracing::debug!("Stored {} bytes under {key}", value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> LibSqlKeyValueStore {
        LibSqlKeyValueStore::new(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_key() {
        let store = setup().await;
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_overwrites_existing_value() {
        let store = setup().await;
        store.set("padelbrain:a", "one").await.unwrap();
        store.set("padelbrain:a", "two").await.unwrap();

        assert_eq!(
            store.get("padelbrain:a").await.unwrap().as_deref(),
            Some("two")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove() {
        let store = setup().await;
        store.set("padelbrain:a", "one").await.unwrap();
        store.remove("padelbrain:a").await.unwrap();
        store.remove("padelbrain:a").await.unwrap();

        assert_eq!(store.get("padelbrain:a").await.unwrap(), None);
    }
}
