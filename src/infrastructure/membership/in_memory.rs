//! In-memory membership directory

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::identity::{TeamId, UserId};
use crate::domain::membership::{MembershipDirectory, TeamMembership};
use crate::domain::role::TeamRole;
use crate::domain::DomainError;

/// Thread-safe in-memory membership directory
///
/// Useful for testing and development where no persistence layer is wired in.
#[derive(Debug, Default)]
pub struct InMemoryMembershipDirectory {
    memberships: RwLock<HashMap<UserId, BTreeMap<TeamId, TeamRole>>>,
}

impl InMemoryMembershipDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a membership
    pub fn add(&self, user: UserId, team: TeamId, role: TeamRole) -> Result<(), DomainError> {
        let mut memberships = self.memberships.write().map_err(|e| {
            DomainError::membership_lookup(format!("Failed to acquire write lock: {}", e))
        })?;

        memberships.entry(user).or_default().insert(team, role);
        Ok(())
    }

    /// Removes a membership, returning whether it existed
    pub fn remove(&self, user: UserId, team: TeamId) -> Result<bool, DomainError> {
        let mut memberships = self.memberships.write().map_err(|e| {
            DomainError::membership_lookup(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(memberships
            .get_mut(&user)
            .is_some_and(|teams| teams.remove(&team).is_some()))
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryMembershipDirectory {
    async fn list_team_memberships(
        &self,
        user: UserId,
    ) -> Result<Vec<TeamMembership>, DomainError> {
        let memberships = self.memberships.read().map_err(|e| {
            DomainError::membership_lookup(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(memberships
            .get(&user)
            .map(|teams| {
                teams
                    .iter()
                    .map(|(team, role)| TeamMembership::new(*team, *role))
                    .collect()
            })
            .unwrap_or_default())
    }
}
