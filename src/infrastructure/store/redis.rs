//! Redis key-value backend

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, IntoConnectionInfo, Script};

use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

/// Deletes the lock key only while it still holds the caller's token
const UNLOCK_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// Configuration for the Redis backend
#[derive(Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Password applied on top of the URL, if any
    pub password: Option<String>,
}

impl fmt::Debug for RedisStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStoreConfig")
            .field("url", &self.url)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            password: None,
        }
    }
}

impl RedisStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Redis backend
///
/// Uses a multiplexed `ConnectionManager`, which reconnects on its own; a
/// request issued while the server is unreachable fails immediately.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisKeyValueStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisKeyValueStore {
    /// Connects to Redis
    pub async fn connect(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let mut info = config.url.as_str().into_connection_info().map_err(|e| {
            DomainError::configuration(format!("Invalid Redis URL '{}': {}", config.url, e))
        })?;

        if let Some(password) = &config.password {
            info.redis.password = Some(password.clone());
        }

        let client = Client::open(info).map_err(|e| {
            DomainError::store_unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            DomainError::store_unavailable(format!("Failed to connect to Redis: {}", e))
        })?;

        Ok(Self { connection, config })
    }
}

fn unavailable(action: &str, key: &str, e: redis::RedisError) -> DomainError {
    DomainError::store_unavailable(format!("Failed to {} '{}': {}", action, key, e))
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| unavailable("get key", key, e))?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: () = conn
            .set(key, value)
            .await
            .map_err(|e| unavailable("set key", key, e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let deleted: i32 = conn
            .del(key)
            .await
            .map_err(|e| unavailable("delete key", key, e))?;

        Ok(deleted > 0)
    }

    async fn expire_at(&self, key: &str, unix_seconds: i64) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let updated: bool = conn
            .expire_at(key, unix_seconds)
            .await
            .map_err(|e| unavailable("schedule expiry of", key, e))?;

        Ok(updated)
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: i64 = conn
            .sadd(set, member)
            .await
            .map_err(|e| unavailable("add to set", set, e))?;

        Ok(())
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: i64 = conn
            .srem(set, member)
            .await
            .map_err(|e| unavailable("remove from set", set, e))?;

        Ok(())
    }

    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let contains: bool = conn
            .sismember(set, member)
            .await
            .map_err(|e| unavailable("check membership of set", set, e))?;

        Ok(contains)
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();

        let members: Vec<String> = conn
            .smembers(set)
            .await
            .map_err(|e| unavailable("list members of set", set, e))?;

        Ok(members)
    }

    async fn try_lock(
        &self,
        name: &str,
        holder: &str,
        lease: Duration,
    ) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();
        let lease_ms = lease.as_millis().max(1) as u64;

        // SET NX PX takes the lock atomically together with its lease
        let result: Option<String> = redis::cmd("SET")
            .arg(name)
            .arg(holder)
            .arg("NX")
            .arg("PX")
            .arg(lease_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("acquire lock", name, e))?;

        Ok(result.is_some())
    }

    async fn unlock(&self, name: &str, holder: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let released: i32 = Script::new(UNLOCK_SCRIPT)
            .key(name)
            .arg(holder)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| unavailable("release lock", name, e))?;

        Ok(released > 0)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("ping", &self.config.url, e))?;

        Ok(())
    }
}
