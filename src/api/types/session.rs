//! Session endpoint payloads

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::access::Requirement;
use crate::domain::role::{Role, Scope};
use crate::domain::{DomainError, Session, SystemRole, TeamId, TeamRole, UserId};

/// Current session as seen by its holder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    #[serde(rename = "userRole")]
    pub user_role: SystemRole,
    #[serde(rename = "clientIP")]
    pub client_ip: String,
    #[serde(rename = "expireDate")]
    pub expire_date: f64,
    #[serde(rename = "teamRoles")]
    pub team_roles: BTreeMap<TeamId, TeamRole>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id(),
            user_role: session.system_role(),
            client_ip: session.client_ip().to_string(),
            expire_date: session.expire_date(),
            team_roles: session.team_roles().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// `GET /session/access` query
#[derive(Debug, Clone, Deserialize)]
pub struct AccessCheckParams {
    pub role: String,
    /// Defaults to the scope the role name belongs to
    pub scope: Option<Scope>,
    pub entity: Option<i64>,
    #[serde(default)]
    pub exact: bool,
}

impl AccessCheckParams {
    /// Resolves the parameters into a requirement
    pub fn requirement(&self) -> Result<Requirement, DomainError> {
        let role = match self.scope {
            Some(scope) => Role::parse_in(scope, &self.role)?,
            None => Role::from_name(&self.role)?,
        };

        let requirement = if self.exact {
            Requirement::exactly(role)?
        } else {
            Requirement::at_least(role)
        };

        Ok(match self.entity {
            Some(entity) => requirement.on(entity),
            None => requirement,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCheckResponse {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<i64>,
    pub exact: bool,
    pub granted: bool,
}
