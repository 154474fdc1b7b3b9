//! Session Gate
//!
//! Token-based sessions over a namespaced key-value store, with role-based
//! access checks across system, organization, and team scopes:
//! - Session issue, validation with sliding expiry, and client IP binding
//! - Role requirements with wildcards, exact matches, and any/all chains
//! - Propagation of role changes into every live session of a user

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{Clock, DomainError, KeyValueStore, MembershipDirectory, SystemClock, TeamId, UserId};
use infrastructure::{
    auth::{AccessService, SessionService},
    membership::InMemoryMembershipDirectory,
    store::{NamespacedStore, StoreFactory, StoreNamespace},
};
use tracing::info;

/// Create the application state from configuration
///
/// Connects the configured store backend and seeds the in-memory membership
/// directory.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate()?;

    let backend = StoreFactory::new()
        .create(config.store.backend, config.redis_config())
        .await?;
    info!(backend = %config.store.backend, "Session store backend ready");

    let memberships = membership_directory(config)?;

    Ok(create_app_state_with(config, backend, Arc::new(memberships), Arc::new(SystemClock)).await?)
}

/// Create the application state around explicit collaborators
pub async fn create_app_state_with(
    config: &AppConfig,
    backend: Arc<dyn KeyValueStore>,
    memberships: Arc<dyn MembershipDirectory>,
    clock: Arc<dyn Clock>,
) -> Result<AppState, DomainError> {
    let namespace = StoreNamespace::new(
        config.app_id.as_str(),
        config.environment.as_str(),
        config.store.database.as_str(),
    );
    let store = NamespacedStore::open(backend, namespace, config.index_lock_config()).await?;

    let session_config = config.session_config();
    info!(
        namespace = %store.namespace(),
        ttl_secs = session_config.ttl.as_secs(),
        "Session services initialized"
    );

    let sessions = SessionService::new(store.clone(), memberships, clock, session_config);
    let access = AccessService::new(store);

    Ok(AppState::new(Arc::new(sessions), Arc::new(access)))
}

fn membership_directory(config: &AppConfig) -> Result<InMemoryMembershipDirectory, DomainError> {
    let directory = InMemoryMembershipDirectory::new();
    for seed in &config.memberships {
        directory.add(UserId::new(seed.user_id), TeamId::new(seed.team_id), seed.role)?;
    }

    if !config.memberships.is_empty() {
        info!(count = config.memberships.len(), "Seeded team memberships");
    }

    Ok(directory)
}
