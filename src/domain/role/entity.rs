//! Role scopes, scoped role enums, and the tagged role value

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Wire name of the wildcard role in every scope
pub const ANY_ROLE_NAME: &str = "any";

/// Partition of the role-ordering space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    System,
    Organization,
    Team,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Organization => write!(f, "organization"),
            Self::Team => write!(f, "team"),
        }
    }
}

impl FromStr for Scope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Self::System),
            "organization" | "org" => Ok(Self::Organization),
            "team" => Ok(Self::Team),
            _ => Err(DomainError::configuration(format!(
                "Unknown role scope: {}. Valid scopes: system, organization, team",
                s
            ))),
        }
    }
}

/// A role enum whose variants are totally ordered inside a single scope
pub trait ScopedRole: 'static + Copy + Eq + Ord + fmt::Display + Into<Role> {
    /// Scope shared by every variant
    const SCOPE: Scope;

    /// Every variant, lowest order first
    const ALL: &'static [Self];

    /// Wire name of the variant
    fn name(&self) -> &'static str;

    /// Position within the scope, higher is more privileged
    fn order(&self) -> u8;

    /// Parses a wire name belonging to this scope
    fn from_name(name: &str) -> Result<Self, DomainError> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.name() == name)
            .ok_or_else(|| DomainError::unknown_role(Self::SCOPE, name))
    }
}

/// System wide roles carried flat on the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemRole {
    #[serde(rename = "member")]
    Participant,
    #[serde(rename = "coach")]
    User,
    #[serde(rename = "admin")]
    GlobalAdmin,
}

impl ScopedRole for SystemRole {
    const SCOPE: Scope = Scope::System;
    const ALL: &'static [Self] = &[Self::Participant, Self::User, Self::GlobalAdmin];

    fn name(&self) -> &'static str {
        match self {
            Self::Participant => "member",
            Self::User => "coach",
            Self::GlobalAdmin => "admin",
        }
    }

    fn order(&self) -> u8 {
        match self {
            Self::Participant => 1,
            Self::User => 2,
            Self::GlobalAdmin => 3,
        }
    }
}

/// Organization level roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgRole {
    #[serde(rename = "company_user")]
    User,
    #[serde(rename = "company_operator")]
    Operator,
    #[serde(rename = "company_admin")]
    CompanyAdmin,
}

impl ScopedRole for OrgRole {
    const SCOPE: Scope = Scope::Organization;
    const ALL: &'static [Self] = &[Self::User, Self::Operator, Self::CompanyAdmin];

    fn name(&self) -> &'static str {
        match self {
            Self::User => "company_user",
            Self::Operator => "company_operator",
            Self::CompanyAdmin => "company_admin",
        }
    }

    fn order(&self) -> u8 {
        match self {
            Self::User => 1,
            Self::Operator => 2,
            Self::CompanyAdmin => 3,
        }
    }
}

/// Roles a user holds inside one team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamRole {
    #[serde(rename = "team_reader")]
    Reader,
    #[serde(rename = "team_member")]
    Member,
    #[serde(rename = "team_coach")]
    Coach,
    #[serde(rename = "team_manager")]
    Manager,
}

impl ScopedRole for TeamRole {
    const SCOPE: Scope = Scope::Team;
    const ALL: &'static [Self] = &[Self::Reader, Self::Member, Self::Coach, Self::Manager];

    fn name(&self) -> &'static str {
        match self {
            Self::Reader => "team_reader",
            Self::Member => "team_member",
            Self::Coach => "team_coach",
            Self::Manager => "team_manager",
        }
    }

    fn order(&self) -> u8 {
        match self {
            Self::Reader => 1,
            Self::Member => 2,
            Self::Coach => 3,
            Self::Manager => 4,
        }
    }
}

macro_rules! impl_scoped_role_traits {
    ($($role:ident => $variant:ident),* $(,)?) => {
        $(
            impl PartialOrd for $role {
                fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                    Some(self.cmp(other))
                }
            }

            impl Ord for $role {
                fn cmp(&self, other: &Self) -> Ordering {
                    self.order().cmp(&other.order())
                }
            }

            impl fmt::Display for $role {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.name())
                }
            }

            impl FromStr for $role {
                type Err = DomainError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::from_name(s)
                }
            }

            impl From<$role> for Role {
                fn from(role: $role) -> Self {
                    Role::$variant(role)
                }
            }
        )*
    };
}

impl_scoped_role_traits!(
    SystemRole => System,
    OrgRole => Organization,
    TeamRole => Team,
);

/// A role of any scope, or the scope-bound wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System(SystemRole),
    Organization(OrgRole),
    Team(TeamRole),
    /// Satisfied by any role the caller holds in the given scope
    Any(Scope),
}

impl Role {
    pub fn scope(&self) -> Scope {
        match self {
            Self::System(_) => Scope::System,
            Self::Organization(_) => Scope::Organization,
            Self::Team(_) => Scope::Team,
            Self::Any(scope) => *scope,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::System(role) => role.name(),
            Self::Organization(role) => role.name(),
            Self::Team(role) => role.name(),
            Self::Any(_) => ANY_ROLE_NAME,
        }
    }

    /// Order within the scope, `None` for the wildcard
    pub fn order(&self) -> Option<u8> {
        match self {
            Self::System(role) => Some(role.order()),
            Self::Organization(role) => Some(role.order()),
            Self::Team(role) => Some(role.order()),
            Self::Any(_) => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any(_))
    }

    /// Parses a wire name inside the given scope, accepting the wildcard
    pub fn parse_in(scope: Scope, name: &str) -> Result<Self, DomainError> {
        if name.eq_ignore_ascii_case(ANY_ROLE_NAME) {
            return Ok(Self::Any(scope));
        }

        match scope {
            Scope::System => SystemRole::from_name(name).map(Self::System),
            Scope::Organization => OrgRole::from_name(name).map(Self::Organization),
            Scope::Team => TeamRole::from_name(name).map(Self::Team),
        }
    }

    /// Parses a concrete wire name, searching every scope
    ///
    /// Wire names are unique across scopes, the wildcard needs [`Role::parse_in`].
    pub fn from_name(name: &str) -> Result<Self, DomainError> {
        SystemRole::from_name(name)
            .map(Self::System)
            .or_else(|_| OrgRole::from_name(name).map(Self::Organization))
            .or_else(|_| TeamRole::from_name(name).map(Self::Team))
            .map_err(|_| DomainError::unknown_role(Self::scope_hint(name), name))
    }

    fn scope_hint(name: &str) -> Scope {
        if name.starts_with("team_") {
            Scope::Team
        } else if name.starts_with("company_") {
            Scope::Organization
        } else {
            Scope::System
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any(scope) => write!(f, "{}:{}", scope, ANY_ROLE_NAME),
            role => write!(f, "{}", role.name()),
        }
    }
}
