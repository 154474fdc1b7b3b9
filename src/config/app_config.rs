use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DomainError, TeamRole};
use crate::infrastructure::auth::{SessionConfig, DEV_ENVIRONMENT};
use crate::infrastructure::store::{IndexLockConfig, RedisStoreConfig, StoreType};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment, part of every store key. `dev` selects the
    /// long session lifetime.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Application prefix of every store key
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Team memberships loaded into the in-memory directory at startup
    #[serde(default)]
    pub memberships: Vec<MembershipSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Session store backend and index lock tuning
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreType,
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Logical database holding sessions
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_lock_lease_ms")]
    pub lock_lease_ms: u64,
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,
    #[serde(default = "default_lock_retry_ms")]
    pub lock_retry_ms: u64,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .field("lock_lease_ms", &self.lock_lease_ms)
            .field("lock_wait_ms", &self.lock_wait_ms)
            .field("lock_retry_ms", &self.lock_retry_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_dev_ttl_secs")]
    pub dev_ttl_secs: u64,
    /// Paths served without a session; a trailing `*` matches by prefix
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembershipSeed {
    pub user_id: i64,
    pub team_id: i64,
    pub role: TeamRole,
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_app_id() -> String {
    "tpa".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_database() -> String {
    "sessions".to_string()
}

fn default_lock_lease_ms() -> u64 {
    10_000
}

fn default_lock_wait_ms() -> u64 {
    5_000
}

fn default_lock_retry_ms() -> u64 {
    10
}

fn default_ttl_secs() -> u64 {
    SessionConfig::DEFAULT_TTL.as_secs()
}

fn default_dev_ttl_secs() -> u64 {
    SessionConfig::DEV_TTL.as_secs()
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            app_id: default_app_id(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
            session: SessionSettings::default(),
            metrics: MetricsConfig::default(),
            memberships: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreType::default(),
            url: default_redis_url(),
            password: None,
            database: default_database(),
            lock_lease_ms: default_lock_lease_ms(),
            lock_wait_ms: default_lock_wait_ms(),
            lock_retry_ms: default_lock_retry_ms(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            dev_ttl_secs: default_dev_ttl_secs(),
            public_paths: default_public_paths(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("session.public_paths")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Rejects settings the services cannot run with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.app_id.is_empty() || self.environment.is_empty() {
            return Err(DomainError::configuration(
                "app_id and environment must not be empty",
            ));
        }
        if self.session.ttl_secs == 0 || self.session.dev_ttl_secs == 0 {
            return Err(DomainError::configuration("session lifetimes must be positive"));
        }
        if self.store.lock_lease_ms == 0 || self.store.lock_retry_ms == 0 {
            return Err(DomainError::configuration(
                "store lock lease and retry interval must be positive",
            ));
        }
        Ok(())
    }

    /// Session lifetime for the configured environment
    pub fn session_config(&self) -> SessionConfig {
        let ttl = if self.environment == DEV_ENVIRONMENT {
            self.session.dev_ttl_secs
        } else {
            self.session.ttl_secs
        };

        let mut config = SessionConfig::new(Duration::from_secs(ttl));
        config.public_paths = self.session.public_paths.clone();
        config
    }

    pub fn index_lock_config(&self) -> IndexLockConfig {
        IndexLockConfig {
            lease: Duration::from_millis(self.store.lock_lease_ms),
            wait: Duration::from_millis(self.store.lock_wait_ms),
            retry_interval: Duration::from_millis(self.store.lock_retry_ms),
        }
    }

    pub fn redis_config(&self) -> RedisStoreConfig {
        let config = RedisStoreConfig::new(&self.store.url);
        match &self.store.password {
            Some(password) => config.with_password(password),
            None => config,
        }
    }
}
