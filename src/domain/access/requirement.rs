//! Role requirements and access changes

use crate::domain::identity::TeamId;
use crate::domain::role::{OrgRole, Role, SystemRole, TeamRole};
use crate::domain::DomainError;

/// A single role requirement a caller must satisfy
///
/// The entity is the team (or organization) the role applies to and is
/// ignored for system roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    role: Role,
    entity: Option<i64>,
    exact: bool,
}

impl Requirement {
    /// Satisfied by `role` or anything above it
    pub fn at_least(role: impl Into<Role>) -> Self {
        Self {
            role: role.into(),
            entity: None,
            exact: false,
        }
    }

    /// Satisfied only by `role` itself
    ///
    /// The wildcard has no exact counterpart and is rejected.
    pub fn exactly(role: impl Into<Role>) -> Result<Self, DomainError> {
        let role = role.into();

        if let Role::Any(scope) = role {
            return Err(DomainError::ExactWildcard { scope });
        }

        Ok(Self {
            role,
            entity: None,
            exact: true,
        })
    }

    /// Binds the requirement to an entity
    pub fn on(mut self, entity: impl Into<i64>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Binds the requirement to a team
    pub fn on_team(self, team: TeamId) -> Self {
        self.on(team.value())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn entity(&self) -> Option<i64> {
        self.entity
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }
}

/// A role mutation to propagate into live sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessChange {
    System(SystemRole),
    Organization { organization: i64, role: OrgRole },
    Team { team: TeamId, role: TeamRole },
}

impl AccessChange {
    pub fn team(team: TeamId, role: TeamRole) -> Self {
        Self::Team { team, role }
    }

    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::Organization { .. } => "organization",
            Self::Team { .. } => "team",
        }
    }
}
