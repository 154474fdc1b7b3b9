//! Explicit comparison between roles, including the scope wildcard

use std::cmp::Ordering;

use super::entity::{Role, Scope};
use crate::domain::DomainError;

/// Outcome of comparing a left role against a right role
///
/// The wildcard is both minimal and maximal against concrete roles of its own
/// scope, so the relation is not a plain [`Ordering`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Both sides are concrete roles of one scope
    Ordered(Ordering),
    /// Concrete role on the left, wildcard on the right
    AboveWildcard,
    /// Wildcard on the left, concrete role on the right
    Wildcard,
    /// Wildcard on both sides, same scope
    BothWildcard,
    /// Wildcard on the left, raw name on the right
    ForeignName,
}

impl Comparison {
    pub fn is_lt(self) -> bool {
        match self {
            Self::Ordered(ordering) => ordering == Ordering::Less,
            Self::ForeignName => true,
            Self::AboveWildcard | Self::Wildcard | Self::BothWildcard => false,
        }
    }

    pub fn is_le(self) -> bool {
        match self {
            Self::Ordered(ordering) => ordering != Ordering::Greater,
            Self::Wildcard | Self::BothWildcard | Self::ForeignName => true,
            Self::AboveWildcard => false,
        }
    }

    pub fn is_gt(self) -> bool {
        match self {
            Self::Ordered(ordering) => ordering == Ordering::Greater,
            Self::AboveWildcard => true,
            Self::Wildcard | Self::BothWildcard | Self::ForeignName => false,
        }
    }

    pub fn is_ge(self) -> bool {
        match self {
            Self::Ordered(ordering) => ordering != Ordering::Less,
            Self::AboveWildcard | Self::Wildcard | Self::BothWildcard => true,
            Self::ForeignName => false,
        }
    }

    pub fn is_eq(self) -> bool {
        match self {
            Self::Ordered(ordering) => ordering == Ordering::Equal,
            Self::BothWildcard => true,
            Self::AboveWildcard | Self::Wildcard | Self::ForeignName => false,
        }
    }
}

impl Role {
    /// Compares two roles of one scope
    ///
    /// Fails with [`DomainError::ScopeMismatch`] when the scopes differ, this is
    /// always a caller bug and never a denial.
    pub fn compare(&self, other: &Role) -> Result<Comparison, DomainError> {
        ensure_same_scope(self.scope(), other.scope())?;

        let comparison = match (self.order(), other.order()) {
            (Some(left), Some(right)) => Comparison::Ordered(left.cmp(&right)),
            (Some(_), None) => Comparison::AboveWildcard,
            (None, Some(_)) => Comparison::Wildcard,
            (None, None) => Comparison::BothWildcard,
        };

        Ok(comparison)
    }

    /// Compares against a raw wire name, coerced into this role's scope
    ///
    /// A wildcard treats every raw name as foreign and is never satisfied. A
    /// concrete role only accepts concrete names, `any` is an unknown role.
    pub fn compare_name(&self, name: &str) -> Result<Comparison, DomainError> {
        if self.is_wildcard() {
            return Ok(Comparison::ForeignName);
        }

        let other = Role::parse_in(self.scope(), name)?;

        if other.is_wildcard() {
            return Err(DomainError::unknown_role(self.scope(), name));
        }

        self.compare(&other)
    }
}

fn ensure_same_scope(left: Scope, right: Scope) -> Result<(), DomainError> {
    if left == right {
        Ok(())
    } else {
        Err(DomainError::ScopeMismatch { left, right })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::{OrgRole, ScopedRole, SystemRole, TeamRole};

    #[test]
    fn test_concrete_ordering_follows_order() {
        for lower in TeamRole::ALL {
            for higher in TeamRole::ALL.iter().filter(|r| *r > lower) {
                let cmp = Role::from(*lower).compare(&Role::from(*higher)).unwrap();
                assert!(cmp.is_lt() && cmp.is_le());
                assert!(!cmp.is_gt() && !cmp.is_ge() && !cmp.is_eq());
            }
        }
    }

    #[test]
    fn test_equal_roles() {
        let cmp = Role::from(SystemRole::User)
            .compare(&Role::from(SystemRole::User))
            .unwrap();
        assert!(cmp.is_eq() && cmp.is_ge() && cmp.is_le());
        assert!(!cmp.is_gt() && !cmp.is_lt());
    }

    #[test]
    fn test_concrete_against_wildcard() {
        for role in OrgRole::ALL {
            let cmp = Role::from(*role).compare(&Role::Any(Scope::Organization)).unwrap();
            assert_eq!(cmp, Comparison::AboveWildcard);
            assert!(cmp.is_ge() && cmp.is_gt());
            assert!(!cmp.is_le() && !cmp.is_lt() && !cmp.is_eq());
        }
    }

    #[test]
    fn test_wildcard_against_concrete() {
        let cmp = Role::Any(Scope::Team)
            .compare(&Role::from(TeamRole::Manager))
            .unwrap();
        assert!(cmp.is_ge() && cmp.is_le());
        assert!(!cmp.is_gt() && !cmp.is_lt() && !cmp.is_eq());
    }

    #[test]
    fn test_wildcard_against_itself() {
        let cmp = Role::Any(Scope::System)
            .compare(&Role::Any(Scope::System))
            .unwrap();
        assert_eq!(cmp, Comparison::BothWildcard);
        assert!(cmp.is_eq());
    }

    #[test]
    fn test_cross_scope_fails_loudly() {
        let err = Role::from(SystemRole::GlobalAdmin)
            .compare(&Role::from(TeamRole::Reader))
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::ScopeMismatch {
                left: Scope::System,
                right: Scope::Team
            }
        ));

        let err = Role::Any(Scope::Team)
            .compare(&Role::Any(Scope::Organization))
            .unwrap_err();
        assert!(matches!(err, DomainError::ScopeMismatch { .. }));
    }

    #[test]
    fn test_compare_name_coerces_into_scope() {
        let cmp = Role::from(TeamRole::Coach).compare_name("team_member").unwrap();
        assert!(cmp.is_gt());

        let err = Role::from(TeamRole::Coach).compare_name("admin").unwrap_err();
        assert!(matches!(err, DomainError::UnknownRole { scope: Scope::Team, .. }));
    }

    #[test]
    fn test_compare_name_rejects_wildcard_name() {
        let err = Role::from(TeamRole::Manager).compare_name("any").unwrap_err();
        assert!(matches!(
            err,
            DomainError::UnknownRole { scope: Scope::Team, ref name } if name == "any"
        ));
    }

    #[test]
    fn test_wildcard_never_satisfied_by_name() {
        let cmp = Role::Any(Scope::Team).compare_name("team_manager").unwrap();
        assert_eq!(cmp, Comparison::ForeignName);
        assert!(!cmp.is_ge() && !cmp.is_gt() && !cmp.is_eq());
        assert!(cmp.is_le() && cmp.is_lt());
    }
}
