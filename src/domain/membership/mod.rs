//! Membership domain - the persistence collaborator sessions are seeded from

mod repository;

pub use repository::{MembershipDirectory, TeamMembership};

#[cfg(test)]
pub use repository::MockMembershipDirectory;
