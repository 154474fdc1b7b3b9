//! Session lifecycle: issue, validate, persist, destroy

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::identity::UserId;
use crate::domain::membership::MembershipDirectory;
use crate::domain::role::SystemRole;
use crate::domain::session::{
    extract_bearer_token, redact_token, Clock, InboundRequest, Session, SessionToken,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_auth_failure, record_session_destroyed, record_session_started,
};
use crate::infrastructure::store::NamespacedStore;

/// Environment name that selects the long-lived development TTL
pub const DEV_ENVIRONMENT: &str = "dev";

/// Session lifetime and request filtering
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl: Duration,
    /// Paths served without a session. A trailing `*` matches by prefix.
    pub public_paths: Vec<String>,
}

impl SessionConfig {
    pub const DEV_TTL: Duration = Duration::from_secs(12 * 60 * 60);
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            public_paths: Vec::new(),
        }
    }

    /// Development sessions live 12 hours, everything else 30 minutes
    pub fn for_environment(environment: &str) -> Self {
        if environment == DEV_ENVIRONMENT {
            Self::new(Self::DEV_TTL)
        } else {
            Self::new(Self::DEFAULT_TTL)
        }
    }

    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| match public.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == public,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

/// Issues and validates sessions against the namespaced store
pub struct SessionService {
    store: NamespacedStore,
    memberships: Arc<dyn MembershipDirectory>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("namespace", self.store.namespace())
            .field("config", &self.config)
            .finish()
    }
}

impl SessionService {
    pub fn new(
        store: NamespacedStore,
        memberships: Arc<dyn MembershipDirectory>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            memberships,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &NamespacedStore {
        &self.store
    }

    /// Creates and persists a session for a freshly logged-in user
    ///
    /// Team roles are snapshotted from the membership directory. The stored
    /// record is scheduled for eviction at the whole second of its expiry.
    pub async fn start_session(
        &self,
        user: UserId,
        role: SystemRole,
        client_ip: &str,
    ) -> Result<Session, DomainError> {
        let team_roles: BTreeMap<_, _> = self
            .memberships
            .list_team_memberships(user)
            .await?
            .into_iter()
            .map(|membership| (membership.team, membership.role))
            .collect();

        let expire_date = self.clock.now() + self.config.ttl.as_secs_f64();
        let session = Session::new(
            SessionToken::generate(),
            user,
            role,
            client_ip,
            expire_date,
            team_roles,
        );

        let key = session.token().as_str();
        self.store.set(key, &session).await?;
        self.store.expire(key, expire_date.floor() as i64).await?;

        record_session_started();
        info!(
            user_id = %user,
            role = %role,
            token = session.token().redacted(),
            teams = session.team_roles().len(),
            "Started session"
        );

        Ok(session)
    }

    /// Validates a token and returns the working copy with its expiry slid
    ///
    /// Expired sessions are destroyed on detection. A session used from a
    /// different address is rejected but kept.
    pub async fn authenticate(&self, token: &str, client_ip: &str) -> Result<Session, DomainError> {
        self.authenticate_token(token, client_ip)
            .await
            .inspect_err(|e| record_auth_failure(e.kind()))
    }

    async fn authenticate_token(&self, token: &str, client_ip: &str) -> Result<Session, DomainError> {
        let mut session = match self.store.get::<Session>(token).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(token = redact_token(token), "Unknown session token");
                return Err(DomainError::InvalidSession);
            }
            Err(DomainError::CorruptPayload { message, .. }) => {
                warn!(token = redact_token(token), error = %message, "Discarding unreadable session");
                self.store.unset(token).await?;
                record_session_destroyed("pruned");
                return Err(DomainError::InvalidSession);
            }
            Err(e) => return Err(e),
        };

        let now = self.clock.now();
        if session.is_expired_at(now) {
            debug!(
                token = session.token().redacted(),
                expire_date = session.expire_date(),
                "Session expired"
            );
            self.store.unset(token).await?;
            record_session_destroyed("expired");
            return Err(DomainError::SessionExpired);
        }

        if !session.is_bound_to(client_ip) {
            warn!(
                token = session.token().redacted(),
                user_id = %session.user_id(),
                bound_ip = session.client_ip(),
                client_ip,
                "Session used from a different client address"
            );
            return Err(DomainError::ClientOriginViolation);
        }

        session.slide_expiry(now, self.config.ttl);
        Ok(session)
    }

    /// Authenticates an inbound request
    ///
    /// Returns `None` for public paths and pre-flight requests.
    pub async fn authenticate_request(
        &self,
        request: &InboundRequest<'_>,
    ) -> Result<Option<Session>, DomainError> {
        if self.config.is_public(request.path) || request.is_preflight() {
            return Ok(None);
        }

        let token = extract_bearer_token(request.authorization)
            .inspect_err(|e| record_auth_failure(e.kind()))?;
        let session = self.authenticate(token, request.client_ip).await?;

        let role = session.system_role();
        if !request.access_limit.is_empty()
            && !request.access_limit.iter().any(|limit| *limit <= role)
        {
            debug!(
                token = session.token().redacted(),
                role = %role,
                path = request.path,
                "Session role below the route's access limit"
            );
            record_auth_failure(DomainError::AccessDenied.kind());
            return Err(DomainError::AccessDenied);
        }

        Ok(Some(session))
    }

    /// Writes the working copy back to the store
    pub async fn save_session(&self, session: &Session) -> Result<(), DomainError> {
        self.store.set(session.token().as_str(), session).await
    }

    /// Removes a session regardless of its state
    pub async fn destroy_session(&self, token: &str) -> Result<(), DomainError> {
        self.store.unset(token).await?;
        record_session_destroyed("logout");
        info!(token = redact_token(token), "Destroyed session");
        Ok(())
    }

    /// Reads a stored session without validating or sliding it
    pub async fn find_session(&self, token: &str) -> Result<Option<Session>, DomainError> {
        self.store.get(token).await
    }

    /// Lists indexed sessions, skipping payloads that do not decode
    pub async fn list_sessions(&self) -> Result<Vec<Session>, DomainError> {
        let sessions = self
            .store
            .list_raw()
            .await?
            .into_iter()
            .filter_map(|(key, data)| match serde_json::from_str::<Session>(&data) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(token = redact_token(&key), error = %e, "Skipping unreadable session");
                    None
                }
            })
            .collect();

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::TeamId;
    use crate::domain::membership::{MockMembershipDirectory, TeamMembership};
    use crate::domain::role::TeamRole;
    use crate::domain::session::ManualClock;
    use crate::domain::store::KeyValueStore;
    use crate::infrastructure::membership::InMemoryMembershipDirectory;
    use crate::infrastructure::store::{
        InMemoryKeyValueStore, IndexLockConfig, StoreNamespace,
    };

    const START: f64 = 1_000_000.0;
    const IP: &str = "10.0.0.1";

    struct Fixture {
        service: SessionService,
        backend: Arc<InMemoryKeyValueStore>,
        clock: Arc<ManualClock>,
    }

    async fn fixture_with(memberships: Arc<dyn MembershipDirectory>) -> Fixture {
        let clock = Arc::new(ManualClock::new(START));
        let backend = Arc::new(InMemoryKeyValueStore::with_clock(clock.clone()));
        let store = NamespacedStore::open(
            backend.clone(),
            StoreNamespace::new("tpa", "test", "sessions"),
            IndexLockConfig::default(),
        )
        .await
        .unwrap();

        let service = SessionService::new(
            store,
            memberships,
            clock.clone(),
            SessionConfig::default().with_public_path("/health"),
        );

        Fixture {
            service,
            backend,
            clock,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(Arc::new(InMemoryMembershipDirectory::new())).await
    }

    #[test]
    fn test_ttl_per_environment() {
        assert_eq!(
            SessionConfig::for_environment("dev").ttl,
            Duration::from_secs(43_200)
        );
        assert_eq!(
            SessionConfig::for_environment("prod").ttl,
            Duration::from_secs(1_800)
        );
        assert_eq!(
            SessionConfig::for_environment("staging").ttl,
            Duration::from_secs(1_800)
        );
    }

    #[test]
    fn test_public_path_matching() {
        let config = SessionConfig::default()
            .with_public_path("/health")
            .with_public_path("/public/*");

        assert!(config.is_public("/health"));
        assert!(!config.is_public("/health/deep"));
        assert!(config.is_public("/public/logo.png"));
        assert!(!config.is_public("/session"));
    }

    #[tokio::test]
    async fn test_start_session_snapshots_team_roles() {
        let mut directory = MockMembershipDirectory::new();
        directory
            .expect_list_team_memberships()
            .withf(|user| *user == UserId::new(42))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    TeamMembership::new(TeamId::new(3), TeamRole::Member),
                    TeamMembership::new(TeamId::new(7), TeamRole::Coach),
                ])
            });
        let f = fixture_with(Arc::new(directory)).await;

        let session = f
            .service
            .start_session(UserId::new(42), SystemRole::Participant, IP)
            .await
            .unwrap();

        assert_eq!(session.user_id(), UserId::new(42));
        assert_eq!(session.system_role(), SystemRole::Participant);
        assert_eq!(session.client_ip(), IP);
        assert_eq!(session.expire_date(), START + 1_800.0);
        assert_eq!(session.team_role(TeamId::new(3)), Some(TeamRole::Member));
        assert_eq!(session.team_role(TeamId::new(7)), Some(TeamRole::Coach));

        let stored = f
            .service
            .find_session(session.token().as_str())
            .await
            .unwrap();
        assert_eq!(stored, Some(session.clone()));

        // Scheduled for eviction, so no longer indexed until saved
        assert!(!f
            .service
            .store()
            .exists(session.token().as_str())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_start_session_fails_on_membership_error() {
        let mut directory = MockMembershipDirectory::new();
        directory
            .expect_list_team_memberships()
            .returning(|_| Err(DomainError::membership_lookup("directory offline")));
        let f = fixture_with(Arc::new(directory)).await;

        let result = f
            .service
            .start_session(UserId::new(1), SystemRole::User, IP)
            .await;
        assert!(matches!(result, Err(DomainError::MembershipLookup { .. })));
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let f = fixture().await;
        let a = f
            .service
            .start_session(UserId::new(1), SystemRole::User, IP)
            .await
            .unwrap();
        let b = f
            .service
            .start_session(UserId::new(1), SystemRole::User, IP)
            .await
            .unwrap();
        assert_ne!(a.token(), b.token());
    }

    #[tokio::test]
    async fn test_authenticate_slides_expiry() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();

        f.clock.advance(Duration::from_secs(600));
        let working = f
            .service
            .authenticate(session.token().as_str(), IP)
            .await
            .unwrap();

        assert_eq!(working.expire_date(), START + 600.0 + 1_800.0);
        assert_eq!(working.token(), session.token());
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let f = fixture().await;
        let result = f.service.authenticate("missing", IP).await;
        assert!(matches!(result, Err(DomainError::InvalidSession)));
    }

    #[tokio::test]
    async fn test_expiry_boundary_destroys_session() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();
        // Saving drops the store-level eviction so only the payload decides
        f.service.save_session(&session).await.unwrap();

        f.clock.set(session.expire_date());
        let token = session.token().as_str();

        assert!(matches!(
            f.service.authenticate(token, IP).await,
            Err(DomainError::SessionExpired)
        ));
        assert!(matches!(
            f.service.authenticate(token, IP).await,
            Err(DomainError::InvalidSession)
        ));
        assert!(!f.service.store().exists(token).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_eviction_invalidates_session() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();

        f.clock.advance(Duration::from_secs(1_800));
        assert!(matches!(
            f.service.authenticate(session.token().as_str(), IP).await,
            Err(DomainError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_ip_binding_keeps_session() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();
        let token = session.token().as_str();

        assert!(matches!(
            f.service.authenticate(token, "10.0.0.2").await,
            Err(DomainError::ClientOriginViolation)
        ));
        assert!(f.service.authenticate(token, IP).await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_discarded() {
        let f = fixture().await;
        f.service
            .store()
            .set_raw("broken", "{\"sessionToken\":\"broken\"}")
            .await
            .unwrap();

        assert!(matches!(
            f.service.authenticate("broken", IP).await,
            Err(DomainError::InvalidSession)
        ));
        assert_eq!(f.service.store().get_raw("broken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_session_is_idempotent() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();
        let token = session.token().as_str();

        f.service.save_session(&session).await.unwrap();
        let first = f.service.store().get_raw(token).await.unwrap();
        f.service.save_session(&session).await.unwrap();
        let second = f.service.store().get_raw(token).await.unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(f.service.store().exists(token).await.unwrap());
    }

    #[tokio::test]
    async fn test_destroy_then_authenticate_is_invalid() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();
        let token = session.token().as_str();

        f.service.destroy_session(token).await.unwrap();
        // Destroying twice is harmless
        f.service.destroy_session(token).await.unwrap();

        assert!(matches!(
            f.service.authenticate(token, IP).await,
            Err(DomainError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_store_outage_is_surfaced() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();

        f.backend.set_available(false);
        assert!(matches!(
            f.service.authenticate(session.token().as_str(), IP).await,
            Err(DomainError::StoreUnavailable { .. })
        ));
        assert!(f.backend.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate_request_skips_public_and_preflight() {
        let f = fixture().await;

        let public = InboundRequest::new(IP, "GET", "/health");
        assert!(f.service.authenticate_request(&public).await.unwrap().is_none());

        let preflight = InboundRequest::new(IP, "OPTIONS", "/session");
        assert!(f
            .service
            .authenticate_request(&preflight)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_authenticate_request_credential_errors() {
        let f = fixture().await;

        let missing = InboundRequest::new(IP, "GET", "/session");
        assert!(matches!(
            f.service.authenticate_request(&missing).await,
            Err(DomainError::NoCredential)
        ));

        let malformed =
            InboundRequest::new(IP, "GET", "/session").with_authorization(Some("Token abc"));
        assert!(matches!(
            f.service.authenticate_request(&malformed).await,
            Err(DomainError::MalformedCredential)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_request_access_limit() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();
        let header = format!("Bearer {}", session.token());

        let admins_only = [SystemRole::GlobalAdmin];
        let request = InboundRequest::new(IP, "GET", "/admin")
            .with_authorization(Some(&header))
            .with_access_limit(&admins_only);
        assert!(matches!(
            f.service.authenticate_request(&request).await,
            Err(DomainError::AccessDenied)
        ));

        let coaches = [SystemRole::GlobalAdmin, SystemRole::User];
        let request = InboundRequest::new(IP, "GET", "/coaching")
            .with_authorization(Some(&header))
            .with_access_limit(&coaches);
        let granted = f.service.authenticate_request(&request).await.unwrap();
        assert_eq!(granted.map(|s| s.user_id()), Some(UserId::new(5)));
    }

    #[tokio::test]
    async fn test_list_sessions_skips_unreadable() {
        let f = fixture().await;
        let session = f
            .service
            .start_session(UserId::new(5), SystemRole::User, IP)
            .await
            .unwrap();
        f.service.save_session(&session).await.unwrap();
        f.service.store().set_raw("junk", "not json").await.unwrap();

        let sessions = f.service.list_sessions().await.unwrap();
        assert_eq!(sessions, vec![session]);
    }
}
