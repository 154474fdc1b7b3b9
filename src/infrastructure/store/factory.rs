//! Backend factory for runtime selection

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryKeyValueStore;
use super::redis::{RedisKeyValueStore, RedisStoreConfig};

/// Supported backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Process-local backend, sessions vanish on restart
    InMemory,
    /// Redis backend
    #[default]
    Redis,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "redis" => Ok(StoreType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown store type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Factory for creating backend instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a backend of the given type
    pub async fn create(
        &self,
        store_type: StoreType,
        redis: RedisStoreConfig,
    ) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        match store_type {
            StoreType::InMemory => Ok(Arc::new(InMemoryKeyValueStore::new())),
            StoreType::Redis => {
                let store = RedisKeyValueStore::connect(redis).await?;
                Ok(Arc::new(store))
            }
        }
    }
}
