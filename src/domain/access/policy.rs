//! Evaluation of role requirements against a session

use tracing::{debug, trace};

use super::requirement::{AccessChange, Requirement};
use crate::domain::identity::TeamId;
use crate::domain::role::{Role, Scope, SystemRole};
use crate::domain::session::Session;
use crate::domain::DomainError;

/// Evaluates one requirement, returning whether it is granted
///
/// Global admins are always granted. Team requirements fail closed when the
/// session holds no role in the team. Organization requirements are not
/// enforced yet and are always granted.
pub fn check(session: &Session, requirement: &Requirement) -> Result<bool, DomainError> {
    if session.system_role() == SystemRole::GlobalAdmin {
        return Ok(true);
    }

    let granted = match requirement.role().scope() {
        Scope::System => satisfies(Role::System(session.system_role()), requirement)?,
        Scope::Organization => {
            debug!(
                role = %requirement.role(),
                entity = ?requirement.entity(),
                "Organization requirement granted without enforcement"
            );
            true
        }
        Scope::Team => {
            let held = requirement
                .entity()
                .and_then(|team| session.team_role(TeamId::new(team)));

            match held {
                Some(role) => satisfies(Role::Team(role), requirement)?,
                None => false,
            }
        }
    };

    trace!(
        user_id = %session.user_id(),
        role = %requirement.role(),
        exact = requirement.is_exact(),
        granted,
        "Evaluated requirement"
    );

    Ok(granted)
}

/// Compares a held role against the required one, honoring exact mode
fn satisfies(held: Role, requirement: &Requirement) -> Result<bool, DomainError> {
    let comparison = held.compare(&requirement.role())?;

    if requirement.is_exact() {
        Ok(comparison.is_eq())
    } else {
        Ok(comparison.is_ge())
    }
}

/// Like [`check`], but a denial is an [`DomainError::AccessDenied`] error
pub fn require(session: &Session, requirement: &Requirement) -> Result<(), DomainError> {
    if check(session, requirement)? {
        Ok(())
    } else {
        Err(DomainError::AccessDenied)
    }
}

/// Granted when at least one requirement is granted
///
/// Denials of individual requirements are absorbed, other errors propagate.
pub fn check_any<'a, I>(session: &Session, requirements: I) -> Result<bool, DomainError>
where
    I: IntoIterator<Item = &'a Requirement>,
{
    for requirement in requirements {
        if check(session, requirement)? {
            return Ok(true);
        }
    }

    Ok(false)
}

pub fn require_any<'a, I>(session: &Session, requirements: I) -> Result<(), DomainError>
where
    I: IntoIterator<Item = &'a Requirement>,
{
    if check_any(session, requirements)? {
        Ok(())
    } else {
        Err(DomainError::AccessDenied)
    }
}

/// Granted when every requirement is granted, stops at the first denial
pub fn check_all<'a, I>(session: &Session, requirements: I) -> Result<bool, DomainError>
where
    I: IntoIterator<Item = &'a Requirement>,
{
    for requirement in requirements {
        if !check(session, requirement)? {
            return Ok(false);
        }
    }

    Ok(true)
}

pub fn require_all<'a, I>(session: &Session, requirements: I) -> Result<(), DomainError>
where
    I: IntoIterator<Item = &'a Requirement>,
{
    if check_all(session, requirements)? {
        Ok(())
    } else {
        Err(DomainError::AccessDenied)
    }
}

/// Applies a role change to one session, returning whether it was modified
pub fn apply_change(session: &mut Session, change: &AccessChange) -> bool {
    match *change {
        AccessChange::System(role) => {
            session.set_system_role(role);
            true
        }
        // Organization roles are not carried on sessions
        AccessChange::Organization { .. } => false,
        AccessChange::Team { team, role } => {
            session.set_team_role(team, role);
            true
        }
    }
}

/// Removes a team from one session, returning whether it was present
pub fn revoke_team(session: &mut Session, team: TeamId) -> bool {
    session.remove_team_role(team).is_some()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::identity::UserId;
    use crate::domain::role::{OrgRole, ScopedRole, TeamRole};
    use crate::domain::session::SessionToken;

    fn session_with(system: SystemRole, teams: &[(i64, TeamRole)]) -> Session {
        let team_roles: BTreeMap<TeamId, TeamRole> = teams
            .iter()
            .map(|(team, role)| (TeamId::new(*team), *role))
            .collect();

        Session::new(
            SessionToken::generate(),
            UserId::new(42),
            system,
            "10.0.0.1",
            2_000_000_000.0,
            team_roles,
        )
    }

    #[test]
    fn test_team_ordering_property() {
        for held in TeamRole::ALL {
            let session = session_with(SystemRole::Participant, &[(5, *held)]);

            for required in TeamRole::ALL {
                let requirement = Requirement::at_least(*required).on(5);
                let granted = check(&session, &requirement).unwrap();
                assert_eq!(granted, held >= required, "held {} required {}", held, required);
            }
        }
    }

    #[test]
    fn test_system_ordering_property() {
        let session = session_with(SystemRole::Participant, &[]);
        assert!(check(&session, &Requirement::at_least(SystemRole::Participant)).unwrap());
        assert!(!check(&session, &Requirement::at_least(SystemRole::User)).unwrap());

        let session = session_with(SystemRole::User, &[]);
        assert!(check(&session, &Requirement::at_least(SystemRole::Participant)).unwrap());
    }

    #[test]
    fn test_exact_requirement() {
        let session = session_with(SystemRole::Participant, &[(5, TeamRole::Manager)]);

        let exact_coach = Requirement::exactly(TeamRole::Coach).unwrap().on(5);
        assert!(!check(&session, &exact_coach).unwrap());

        let exact_manager = Requirement::exactly(TeamRole::Manager).unwrap().on(5);
        assert!(check(&session, &exact_manager).unwrap());
    }

    #[test]
    fn test_satisfies_exact_mode() {
        let held = Role::from(TeamRole::Manager);

        let at_least = Requirement::at_least(TeamRole::Coach);
        assert!(satisfies(held, &at_least).unwrap());

        let exact = Requirement::exactly(TeamRole::Coach).unwrap();
        assert!(!satisfies(held, &exact).unwrap());

        let exact = Requirement::exactly(TeamRole::Manager).unwrap();
        assert!(satisfies(held, &exact).unwrap());

        let wildcard = Requirement::at_least(Role::Any(Scope::Team));
        assert!(satisfies(held, &wildcard).unwrap());
    }

    #[test]
    fn test_satisfies_rejects_foreign_scope() {
        let held = Role::from(SystemRole::User);
        let err = satisfies(held, &Requirement::at_least(TeamRole::Reader)).unwrap_err();
        assert!(matches!(err, DomainError::ScopeMismatch { .. }));
    }

    #[test]
    fn test_team_wildcard_property() {
        let any_team = Requirement::at_least(Role::Any(Scope::Team)).on(5);

        for held in TeamRole::ALL {
            let session = session_with(SystemRole::Participant, &[(5, *held)]);
            assert!(check(&session, &any_team).unwrap());
        }

        let outsider = session_with(SystemRole::Participant, &[(6, TeamRole::Manager)]);
        assert!(!check(&outsider, &any_team).unwrap());
    }

    #[test]
    fn test_system_wildcard_always_held() {
        let session = session_with(SystemRole::Participant, &[]);
        assert!(check(&session, &Requirement::at_least(Role::Any(Scope::System))).unwrap());
    }

    #[test]
    fn test_team_requirement_without_entity_fails_closed() {
        let session = session_with(SystemRole::User, &[(5, TeamRole::Manager)]);
        assert!(!check(&session, &Requirement::at_least(TeamRole::Reader)).unwrap());
    }

    #[test]
    fn test_global_admin_short_circuits() {
        let session = session_with(SystemRole::GlobalAdmin, &[]);
        assert!(check(&session, &Requirement::at_least(TeamRole::Manager).on(99)).unwrap());
        assert!(require(&session, &Requirement::exactly(SystemRole::Participant).unwrap()).is_ok());
    }

    #[test]
    fn test_organization_requirement_is_stubbed() {
        let session = session_with(SystemRole::Participant, &[]);
        let requirement = Requirement::at_least(OrgRole::CompanyAdmin).on(1);
        assert!(check(&session, &requirement).unwrap());
    }

    #[test]
    fn test_strict_variant_denies() {
        let session = session_with(SystemRole::Participant, &[]);
        let err = require(&session, &Requirement::at_least(SystemRole::User)).unwrap_err();
        assert!(matches!(err, DomainError::AccessDenied));
    }

    #[test]
    fn test_any_and_all_chains() {
        let session = session_with(SystemRole::Participant, &[(5, TeamRole::Member)]);
        let denied = Requirement::at_least(TeamRole::Manager).on(5);
        let granted = Requirement::at_least(TeamRole::Reader).on(5);

        assert!(check_any(&session, [&denied, &granted]).unwrap());
        assert!(require_any(&session, [&granted, &denied]).is_ok());
        assert!(!check_any(&session, [&denied]).unwrap());
        assert!(matches!(
            require_any(&session, [&denied, &denied]),
            Err(DomainError::AccessDenied)
        ));
        assert!(!check_any(&session, std::iter::empty::<&Requirement>()).unwrap());

        assert!(check_all(&session, [&granted, &granted]).unwrap());
        assert!(!check_all(&session, [&granted, &denied]).unwrap());
        assert!(matches!(
            require_all(&session, [&denied, &granted]),
            Err(DomainError::AccessDenied)
        ));
        assert!(check_all(&session, std::iter::empty::<&Requirement>()).unwrap());
    }

    #[test]
    fn test_apply_and_revoke() {
        let mut session = session_with(SystemRole::Participant, &[(3, TeamRole::Reader)]);

        assert!(apply_change(&mut session, &AccessChange::team(TeamId::new(3), TeamRole::Coach)));
        assert_eq!(session.team_role(TeamId::new(3)), Some(TeamRole::Coach));

        assert!(apply_change(&mut session, &AccessChange::System(SystemRole::User)));
        assert_eq!(session.system_role(), SystemRole::User);

        let org = AccessChange::Organization {
            organization: 1,
            role: OrgRole::Operator,
        };
        assert!(!apply_change(&mut session, &org));

        assert!(revoke_team(&mut session, TeamId::new(3)));
        assert!(!revoke_team(&mut session, TeamId::new(3)));
    }
}
