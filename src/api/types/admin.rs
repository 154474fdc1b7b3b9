//! Administrative session endpoint payloads

use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::session::SessionResponse;
use crate::domain::access::AccessChange;
use crate::domain::role::Role;
use crate::domain::{DomainError, Session, TeamId};
use crate::infrastructure::auth::PropagationSummary;

/// One stored session, token shortened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub token: String,
    #[serde(flatten)]
    pub session: SessionResponse,
}

impl From<&Session> for SessionEntry {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token().redacted().to_string(),
            session: SessionResponse::from(session),
        }
    }
}

/// `PUT /admin/users/{user}/roles` body
#[derive(Debug, Clone, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
    /// Team or organization the role applies to; unused for system roles
    pub entity: Option<i64>,
}

impl RoleChangeRequest {
    pub fn into_change(self) -> Result<AccessChange, ApiError> {
        match Role::from_name(&self.role)? {
            Role::System(role) => Ok(AccessChange::System(role)),
            Role::Organization(role) => {
                let organization = self
                    .entity
                    .ok_or_else(|| ApiError::bad_parameter("entity is required for organization roles"))?;
                Ok(AccessChange::Organization { organization, role })
            }
            Role::Team(role) => {
                let team = self
                    .entity
                    .ok_or_else(|| ApiError::bad_parameter("entity is required for team roles"))?;
                Ok(AccessChange::team(TeamId::new(team), role))
            }
            Role::Any(scope) => Err(DomainError::unknown_role(scope, self.role).into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleChangeResponse {
    pub success: bool,
    /// Stored sessions rewritten, including the caller's own
    pub updated: usize,
    pub pruned: usize,
}

impl From<PropagationSummary> for RoleChangeResponse {
    fn from(summary: PropagationSummary) -> Self {
        Self {
            success: true,
            updated: summary.updated,
            pruned: summary.pruned,
        }
    }
}
