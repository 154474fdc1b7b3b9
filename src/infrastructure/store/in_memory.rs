//! In-memory key-value backend

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::session::{Clock, SystemClock};
use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

/// Stored value with an optional absolute eviction time (unix seconds)
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<i64>,
}

#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    until: f64,
}

/// Thread-safe in-memory backend
///
/// Useful for testing and single-process development. Expiry is evaluated
/// lazily against the injected clock: an expired value is dropped when it is
/// read, and every expired value is dropped when a set is enumerated. Data is
/// lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, Entry>>,
    sets: RwLock<HashMap<String, BTreeSet<String>>>,
    locks: Mutex<HashMap<String, Lease>>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKeyValueStore {
    /// Creates an empty store on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store evaluating expiry against `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            sets: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            clock,
            available: AtomicBool::new(true),
        }
    }

    /// Simulates losing (or regaining) the connection to the store
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::store_unavailable("in-memory store is offline"))
        }
    }

    fn is_live(&self, entry: &Entry) -> bool {
        match entry.expires_at {
            Some(at) => self.clock.now() < at as f64,
            None => true,
        }
    }

    /// Drops every value whose eviction time has passed
    fn purge_expired(&self) -> Result<(), DomainError> {
        let mut values = self.values.write().map_err(poisoned)?;
        values.retain(|_, entry| self.is_live(entry));
        Ok(())
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> DomainError {
    DomainError::store_unavailable(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.check_available()?;
        let mut values = self.values.write().map_err(poisoned)?;

        match values.get(key) {
            Some(entry) if self.is_live(entry) => Ok(Some(entry.value.clone())),
            Some(_) => {
                values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.check_available()?;
        let mut values = self.values.write().map_err(poisoned)?;

        values.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut values = self.values.write().map_err(poisoned)?;

        Ok(values
            .remove(key)
            .is_some_and(|entry| self.is_live(&entry)))
    }

    async fn expire_at(&self, key: &str, unix_seconds: i64) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut values = self.values.write().map_err(poisoned)?;

        match values.get_mut(key) {
            Some(entry) if self.is_live(entry) => {
                entry.expires_at = Some(unix_seconds);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<(), DomainError> {
        self.check_available()?;
        let mut sets = self.sets.write().map_err(poisoned)?;

        sets.entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<(), DomainError> {
        self.check_available()?;
        let mut sets = self.sets.write().map_err(poisoned)?;

        if let Some(members) = sets.get_mut(set) {
            members.remove(member);

            if members.is_empty() {
                sets.remove(set);
            }
        }
        Ok(())
    }

    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, DomainError> {
        self.check_available()?;
        let sets = self.sets.read().map_err(poisoned)?;

        Ok(sets.get(set).is_some_and(|members| members.contains(member)))
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, DomainError> {
        self.check_available()?;
        self.purge_expired()?;
        let sets = self.sets.read().map_err(poisoned)?;

        Ok(sets
            .get(set)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn try_lock(
        &self,
        name: &str,
        holder: &str,
        lease: Duration,
    ) -> Result<bool, DomainError> {
        self.check_available()?;
        let now = self.clock.now();
        let mut locks = self.locks.lock().map_err(poisoned)?;

        if let Some(current) = locks.get(name) {
            if current.until > now {
                return Ok(false);
            }
        }

        locks.insert(
            name.to_string(),
            Lease {
                holder: holder.to_string(),
                until: now + lease.as_secs_f64(),
            },
        );
        Ok(true)
    }

    async fn unlock(&self, name: &str, holder: &str) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut locks = self.locks.lock().map_err(poisoned)?;

        match locks.get(name) {
            Some(current) if current.holder == holder => {
                locks.remove(name);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.check_available()
    }
}
