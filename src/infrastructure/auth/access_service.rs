//! Propagation of role changes to live sessions

use tracing::{debug, info, warn};

use crate::domain::access::{policy, AccessChange};
use crate::domain::identity::{TeamId, UserId};
use crate::domain::session::{redact_token, Session};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_access_change, record_session_destroyed};
use crate::infrastructure::store::NamespacedStore;

/// Outcome of a propagation scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationSummary {
    /// Stored sessions of the user that were rewritten
    pub updated: usize,
    /// Unreadable payloads removed during the scan
    pub pruned: usize,
    /// Whether the caller's in-flight copy was changed
    pub current_updated: bool,
}

/// Rewrites the stored sessions of a user when their roles change
///
/// Scans every indexed session without cross-session locking, so a
/// concurrent save of the same session may overwrite the change.
#[derive(Debug, Clone)]
pub struct AccessService {
    store: NamespacedStore,
}

impl AccessService {
    pub fn new(store: NamespacedStore) -> Self {
        Self { store }
    }

    /// Applies a role change to every live session of `user`
    ///
    /// `current` is the caller's working copy; it is changed as well when it
    /// belongs to `user`, since it would otherwise overwrite the stored update
    /// at the end of the request.
    pub async fn refresh_user_access(
        &self,
        user: UserId,
        change: &AccessChange,
        current: Option<&mut Session>,
    ) -> Result<PropagationSummary, DomainError> {
        if let AccessChange::Organization { organization, role } = change {
            debug!(
                user_id = %user,
                organization,
                role = %role,
                "Organization roles are not carried on sessions"
            );
        }

        let summary = self
            .propagate(user, current, |session| policy::apply_change(session, change))
            .await?;

        record_access_change(change.kind(), summary.updated);
        info!(
            user_id = %user,
            kind = change.kind(),
            updated = summary.updated,
            pruned = summary.pruned,
            "Refreshed user access"
        );

        Ok(summary)
    }

    /// Removes `team` from every live session of `user`
    pub async fn revoke_user_access(
        &self,
        user: UserId,
        team: TeamId,
        current: Option<&mut Session>,
    ) -> Result<PropagationSummary, DomainError> {
        let summary = self
            .propagate(user, current, |session| policy::revoke_team(session, team))
            .await?;

        record_access_change("revoke", summary.updated);
        info!(
            user_id = %user,
            team_id = %team,
            updated = summary.updated,
            pruned = summary.pruned,
            "Revoked user access"
        );

        Ok(summary)
    }

    async fn propagate<F>(
        &self,
        user: UserId,
        current: Option<&mut Session>,
        mutate: F,
    ) -> Result<PropagationSummary, DomainError>
    where
        F: Fn(&mut Session) -> bool,
    {
        let mut summary = PropagationSummary::default();

        for (key, data) in self.store.list_raw().await? {
            let mut session = match serde_json::from_str::<Session>(&data) {
                Ok(session) => session,
                Err(e) => {
                    warn!(token = redact_token(&key), error = %e, "Pruning unreadable session");
                    self.store.unset(&key).await?;
                    record_session_destroyed("pruned");
                    summary.pruned += 1;
                    continue;
                }
            };

            if session.user_id() != user || !mutate(&mut session) {
                continue;
            }

            self.store.set(&key, &session).await?;
            summary.updated += 1;
        }

        if let Some(current) = current.filter(|session| session.user_id() == user) {
            summary.current_updated = mutate(current);
        }

        Ok(summary)
    }
}
