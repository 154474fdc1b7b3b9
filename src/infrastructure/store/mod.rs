//! Store infrastructure - key-value backends and the namespaced store

mod factory;
mod in_memory;
mod namespaced;
mod redis;

pub use factory::{StoreFactory, StoreType};
pub use in_memory::InMemoryKeyValueStore;
pub use namespaced::{IndexLockConfig, NamespacedStore, StoreNamespace, DATABASES_KEY};
pub use redis::{RedisKeyValueStore, RedisStoreConfig};
