//! Session entity and token

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::{TeamId, UserId};
use crate::domain::role::{SystemRole, TeamRole};

/// Opaque session token, the lookup key of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a fresh random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters only, safe to log
    pub fn redacted(&self) -> &str {
        redact_token(&self.0)
    }
}

/// Leading characters of a raw token, for log fields
pub fn redact_token(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(idx, _)| idx)
        .unwrap_or(token.len());
    &token[..end]
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One authenticated login
///
/// Serialized with the field names existing session payloads use, so the
/// stored JSON stays readable across deployments. `teamRoles` is ordered to
/// keep the payload byte-stable between saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "sessionToken")]
    token: SessionToken,
    #[serde(rename = "userID")]
    user_id: UserId,
    #[serde(rename = "userRole")]
    user_role: SystemRole,
    #[serde(rename = "clientIP")]
    client_ip: String,
    /// Absolute expiry in unix seconds
    #[serde(rename = "expireDate")]
    expire_date: f64,
    #[serde(rename = "teamRoles")]
    team_roles: BTreeMap<TeamId, TeamRole>,
}

impl Session {
    pub fn new(
        token: SessionToken,
        user_id: UserId,
        user_role: SystemRole,
        client_ip: impl Into<String>,
        expire_date: f64,
        team_roles: BTreeMap<TeamId, TeamRole>,
    ) -> Self {
        Self {
            token,
            user_id,
            user_role,
            client_ip: client_ip.into(),
            expire_date,
            team_roles,
        }
    }

    // Getters

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn system_role(&self) -> SystemRole {
        self.user_role
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn expire_date(&self) -> f64 {
        self.expire_date
    }

    pub fn team_roles(&self) -> &BTreeMap<TeamId, TeamRole> {
        &self.team_roles
    }

    pub fn team_role(&self, team: TeamId) -> Option<TeamRole> {
        self.team_roles.get(&team).copied()
    }

    /// A session whose expiry is not strictly in the future is expired
    pub fn is_expired_at(&self, now: f64) -> bool {
        now >= self.expire_date
    }

    pub fn is_bound_to(&self, client_ip: &str) -> bool {
        self.client_ip == client_ip
    }

    // Mutations

    /// Pushes the expiry to `now + ttl`
    pub fn slide_expiry(&mut self, now: f64, ttl: Duration) {
        self.expire_date = now + ttl.as_secs_f64();
    }

    pub fn set_system_role(&mut self, role: SystemRole) {
        self.user_role = role;
    }

    pub fn set_team_role(&mut self, team: TeamId, role: TeamRole) {
        self.team_roles.insert(team, role);
    }

    pub fn remove_team_role(&mut self, team: TeamId) -> Option<TeamRole> {
        self.team_roles.remove(&team)
    }
}
