//! Team membership lookup used to seed sessions at login

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::identity::{TeamId, UserId};
use crate::domain::role::TeamRole;
use crate::domain::DomainError;

/// A user's role in one team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamMembership {
    pub team: TeamId,
    pub role: TeamRole,
}

impl TeamMembership {
    pub fn new(team: TeamId, role: TeamRole) -> Self {
        Self { team, role }
    }
}

/// Read access to team memberships owned by the persistence layer
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Lists every team the user belongs to, with the role held there
    async fn list_team_memberships(&self, user: UserId)
    -> Result<Vec<TeamMembership>, DomainError>;
}
