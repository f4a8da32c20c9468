//! Bounded retry with exponential backoff for storage calls

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

use super::KeyValueStore;

/// Retry policy for storage operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failure (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retrying after the given failed attempt (1-based):
    /// `min(base_delay * 2^(attempt - 1), max_delay)`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }
}

/// `KeyValueStore` wrapper that retries transient backend failures.
///
/// Only storage-level errors are retried. Once the policy is exhausted the
/// last error is surfaced as [`Error::StorageFailure`].
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: KeyValueStore> RetryingStore<S> {
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        key: &str,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_storage() && attempt < max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Storage {operation} for '{key}' failed (attempt {attempt}/{max_attempts}): {error}; retrying in {delay:?}"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) if error.is_storage() => {
                    return Err(Error::StorageFailure {
                        operation,
                        key: key.to_string(),
                        attempts: attempt,
                        message: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl<S: KeyValueStore> KeyValueStore for RetryingStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_retry("get", key, || self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_retry("set", key, || self.inner.set(key, value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.with_retry("remove", key, || self.inner.remove(key))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with an IO error
    struct FlakyStore {
        inner: MemoryStore,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn check(&self) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(io::Error::other("disk busy").into());
            }
            Ok(())
        }
    }

    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.check()?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.check()?;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.check()?;
            self.inner.remove(key).await
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let store = RetryingStore::new(FlakyStore::new(2), RetryPolicy::immediate(3));

        store.set("k", "v").await.unwrap();

        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = RetryingStore::new(FlakyStore::new(10), RetryPolicy::immediate(3));

        let error = store.set("k", "v").await.unwrap_err();

        match error {
            Error::StorageFailure {
                operation,
                key,
                attempts,
                ..
            } => {
                assert_eq!(operation, "set");
                assert_eq!(key, "k");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_storage_errors_are_not_retried() {
        struct Rejecting(AtomicU32);

        impl KeyValueStore for Rejecting {
            async fn get(&self, _key: &str) -> Result<Option<String>> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(Error::InvalidInput("bad key".into()))
            }

            async fn set(&self, _key: &str, _value: &str) -> Result<()> {
                Ok(())
            }

            async fn remove(&self, _key: &str) -> Result<()> {
                Ok(())
            }
        }

        let store = RetryingStore::new(Rejecting(AtomicU32::new(0)), RetryPolicy::immediate(3));

        assert!(matches!(store.get("k").await, Err(Error::InvalidInput(_))));
        assert_eq!(store.inner().0.load(Ordering::SeqCst), 1);
    }
}
