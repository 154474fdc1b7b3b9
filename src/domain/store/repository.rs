//! Key-value backend trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// String-keyed blob store with expiry, sets, and leased locks
///
/// Implementations talk to a shared external store (Redis in production).
/// Every failure to reach the store is reported as
/// [`DomainError::StoreUnavailable`]; nothing is retried here.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Gets a raw value
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value without expiry, clearing any scheduled expiry
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Deletes a value, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Schedules deletion at an absolute unix timestamp (seconds)
    async fn expire_at(&self, key: &str, unix_seconds: i64) -> Result<bool, DomainError>;

    /// Adds a member to a set
    async fn set_add(&self, set: &str, member: &str) -> Result<(), DomainError>;

    /// Removes a member from a set
    async fn set_remove(&self, set: &str, member: &str) -> Result<(), DomainError>;

    /// Checks set membership
    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, DomainError>;

    /// Lists all members of a set
    async fn set_members(&self, set: &str) -> Result<Vec<String>, DomainError>;

    /// Takes the named lock for `holder` if nobody holds it
    ///
    /// The lock is released automatically after `lease` so a crashed holder
    /// cannot wedge the namespace.
    async fn try_lock(&self, name: &str, holder: &str, lease: Duration)
    -> Result<bool, DomainError>;

    /// Releases the named lock if `holder` still owns it
    async fn unlock(&self, name: &str, holder: &str) -> Result<bool, DomainError>;

    /// Round-trips to the store
    async fn ping(&self) -> Result<(), DomainError>;
}
