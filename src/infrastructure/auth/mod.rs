//! Authentication and authorization services
//!
//! `SessionService` owns the session lifecycle, `AccessService` pushes role
//! changes into sessions that are already live.

mod access_service;
mod session_service;

pub use access_service::{AccessService, PropagationSummary};
pub use session_service::{SessionConfig, SessionService, DEV_ENVIRONMENT};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::access::{policy, Requirement};
    use crate::domain::identity::{TeamId, UserId};
    use crate::domain::role::{Role, Scope, SystemRole, TeamRole};
    use crate::domain::session::ManualClock;
    use crate::domain::DomainError;
    use crate::infrastructure::membership::InMemoryMembershipDirectory;
    use crate::infrastructure::store::{
        InMemoryKeyValueStore, IndexLockConfig, NamespacedStore, StoreNamespace,
    };

    const IP: &str = "192.168.1.20";

    async fn services(
        memberships: InMemoryMembershipDirectory,
    ) -> (SessionService, AccessService) {
        let clock = Arc::new(ManualClock::new(1_700_000_000.0));
        let backend = Arc::new(InMemoryKeyValueStore::with_clock(clock.clone()));
        let store = NamespacedStore::open(
            backend,
            StoreNamespace::new("tpa", "test", "sessions"),
            IndexLockConfig::default(),
        )
        .await
        .unwrap();

        let sessions = SessionService::new(
            store.clone(),
            Arc::new(memberships),
            clock,
            SessionConfig::for_environment("test"),
        );
        (sessions, AccessService::new(store))
    }

    #[tokio::test]
    async fn test_session_lifecycle_end_to_end() {
        let (sessions, access) = services(InMemoryMembershipDirectory::new()).await;
        let user = UserId::new(42);

        let session = sessions
            .start_session(user, SystemRole::Participant, IP)
            .await
            .unwrap();
        let token = session.token().as_str().to_string();

        let mut working = sessions.authenticate(&token, IP).await.unwrap();
        assert_eq!(working.user_id(), user);
        assert!(working.team_roles().is_empty());

        let summary = access
            .revoke_user_access(user, TeamId::new(3), Some(&mut working))
            .await
            .unwrap();
        assert_eq!(summary.updated, 0);
        assert!(!summary.current_updated);

        sessions.save_session(&working).await.unwrap();
        sessions.destroy_session(&token).await.unwrap();

        assert!(matches!(
            sessions.authenticate(&token, IP).await,
            Err(DomainError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_promotion_reaches_saved_sessions_and_grants_access() {
        let directory = InMemoryMembershipDirectory::new();
        directory
            .add(UserId::new(42), TeamId::new(7), TeamRole::Member)
            .unwrap();
        let (sessions, access) = services(directory).await;
        let user = UserId::new(42);

        // Two devices, both saved so they are enumerable
        let phone = sessions
            .start_session(user, SystemRole::Participant, IP)
            .await
            .unwrap();
        let laptop = sessions
            .start_session(user, SystemRole::Participant, IP)
            .await
            .unwrap();
        sessions.save_session(&phone).await.unwrap();
        sessions.save_session(&laptop).await.unwrap();

        let manage_team = Requirement::at_least(TeamRole::Manager).on_team(TeamId::new(7));
        let mut working = sessions
            .authenticate(laptop.token().as_str(), IP)
            .await
            .unwrap();
        assert!(!policy::check(&working, &manage_team).unwrap());

        access
            .refresh_user_access(
                user,
                &crate::domain::AccessChange::team(TeamId::new(7), TeamRole::Manager),
                Some(&mut working),
            )
            .await
            .unwrap();

        assert!(policy::check(&working, &manage_team).unwrap());
        sessions.save_session(&working).await.unwrap();

        let phone_now = sessions
            .authenticate(phone.token().as_str(), IP)
            .await
            .unwrap();
        assert_eq!(phone_now.team_role(TeamId::new(7)), Some(TeamRole::Manager));
        assert!(policy::require(&phone_now, &manage_team).is_ok());
        let any_team = Requirement::at_least(Role::Any(Scope::Team));
        assert!(policy::check(&phone_now, &any_team.on_team(TeamId::new(7))).unwrap());
        assert!(!policy::check(&phone_now, &any_team).unwrap());
    }
}
