//! Namespaced key-value store with a known-keys index

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

/// Global set every namespace registers itself in
pub const DATABASES_KEY: &str = "_dbs";

/// Identifies one logical database inside a shared backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNamespace {
    pub app_id: String,
    pub environment: String,
    pub database: String,
}

impl StoreNamespace {
    pub fn new(
        app_id: impl Into<String>,
        environment: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            environment: environment.into(),
            database: database.into(),
        }
    }

    /// `{app}_{environment}_{database}`
    pub fn qualified(&self) -> String {
        format!("{}_{}_{}", self.app_id, self.environment, self.database)
    }
}

impl fmt::Display for StoreNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// Tuning for the namespace-wide index lock
#[derive(Debug, Clone)]
pub struct IndexLockConfig {
    /// How long an acquired lock stays valid if never released
    pub lease: Duration,
    /// How long to wait for the lock before giving up
    pub wait: Duration,
    /// Pause between acquisition attempts
    pub retry_interval: Duration,
}

impl Default for IndexLockConfig {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(10),
            wait: Duration::from_secs(5),
            retry_interval: Duration::from_millis(10),
        }
    }
}

/// Key-value store scoped to one namespace
///
/// Values live under `{ns}_v_{key}`. The set `{ns}_m_keys` indexes known keys
/// so they can be enumerated; keys scheduled to expire are dropped from it
/// eagerly. `set` and `unset` hold `{ns}_m_keys_lock` so the index update and
/// the value write land together. Reads take no lock.
#[derive(Debug, Clone)]
pub struct NamespacedStore {
    backend: Arc<dyn KeyValueStore>,
    namespace: StoreNamespace,
    value_prefix: String,
    keylist_key: String,
    lock_key: String,
    lock: IndexLockConfig,
}

impl NamespacedStore {
    /// Opens the namespace, registering it in the global databases set
    pub async fn open(
        backend: Arc<dyn KeyValueStore>,
        namespace: StoreNamespace,
        lock: IndexLockConfig,
    ) -> Result<Self, DomainError> {
        let qualified = namespace.qualified();
        backend.set_add(DATABASES_KEY, &qualified).await?;

        let management_prefix = format!("{}_m_", qualified);
        let keylist_key = format!("{}keys", management_prefix);

        debug!(namespace = %qualified, "Opened namespaced store");

        Ok(Self {
            backend,
            value_prefix: format!("{}_v_", qualified),
            lock_key: format!("{}_lock", keylist_key),
            keylist_key,
            namespace,
            lock,
        })
    }

    pub fn namespace(&self) -> &StoreNamespace {
        &self.namespace
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    fn value_key(&self, key: &str) -> String {
        format!("{}{}", self.value_prefix, key)
    }

    /// Serializes and writes a value, indexing its key
    pub async fn set<V>(&self, key: &str, value: &V) -> Result<(), DomainError>
    where
        V: Serialize + Sync,
    {
        let data = serde_json::to_string(value)
            .map_err(|e| DomainError::corrupt_payload(key, format!("serialization failed: {}", e)))?;

        self.set_raw(key, &data).await
    }

    /// Writes a raw value, indexing its key
    pub async fn set_raw(&self, key: &str, data: &str) -> Result<(), DomainError> {
        let value_key = self.value_key(key);

        self.with_index_lock(async {
            self.backend.set_add(&self.keylist_key, key).await?;
            self.backend.set(&value_key, data).await
        })
        .await
    }

    /// Reads and deserializes a value
    pub async fn get<V>(&self, key: &str) -> Result<Option<V>, DomainError>
    where
        V: DeserializeOwned,
    {
        match self.get_raw(key).await? {
            Some(data) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|e| DomainError::corrupt_payload(key, e.to_string())),
            None => Ok(None),
        }
    }

    /// Reads a raw value
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.backend.get(&self.value_key(key)).await
    }

    /// Removes a value and its index entry
    pub async fn unset(&self, key: &str) -> Result<(), DomainError> {
        let value_key = self.value_key(key);

        self.with_index_lock(async {
            self.backend.set_remove(&self.keylist_key, key).await?;
            self.backend.delete(&value_key).await?;
            Ok(())
        })
        .await
    }

    /// Schedules eviction at `at_unix_seconds` and drops the key from the index
    ///
    /// Keys pending expiry are not enumerable afterwards.
    pub async fn expire(&self, key: &str, at_unix_seconds: i64) -> Result<(), DomainError> {
        self.backend
            .expire_at(&self.value_key(key), at_unix_seconds)
            .await?;
        self.backend.set_remove(&self.keylist_key, key).await
    }

    /// Index membership; says nothing about whether the value is still readable
    pub async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        self.backend.set_contains(&self.keylist_key, key).await
    }

    /// Fetches every indexed key with its raw value
    ///
    /// Indexed keys whose value has been evicted are skipped.
    pub async fn list_raw(&self) -> Result<BTreeMap<String, String>, DomainError> {
        let keys = self.backend.set_members(&self.keylist_key).await?;
        let mut entries = BTreeMap::new();

        for key in keys {
            if let Some(data) = self.get_raw(&key).await? {
                entries.insert(key, data);
            }
        }

        Ok(entries)
    }

    async fn with_index_lock<F, T>(&self, operation: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let holder = self.acquire_index_lock().await?;
        let result = operation.await;
        let released = self.backend.unlock(&self.lock_key, &holder).await;

        let value = result?;

        match released {
            Ok(true) => {}
            Ok(false) => warn!(
                namespace = %self.namespace,
                "Index lock lease ran out before release"
            ),
            Err(e) => return Err(e),
        }

        Ok(value)
    }

    async fn acquire_index_lock(&self) -> Result<String, DomainError> {
        let holder = Uuid::new_v4().to_string();
        let started = Instant::now();

        loop {
            if self
                .backend
                .try_lock(&self.lock_key, &holder, self.lock.lease)
                .await?
            {
                return Ok(holder);
            }

            if started.elapsed() >= self.lock.wait {
                return Err(DomainError::store_unavailable(format!(
                    "Timed out after {:?} waiting for index lock of '{}'",
                    self.lock.wait, self.namespace
                )));
            }

            tokio::time::sleep(self.lock.retry_interval).await;
        }
    }
}
