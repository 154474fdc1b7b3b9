//! Domain layer - Roles, sessions, and access rules

pub mod access;
pub mod error;
pub mod identity;
pub mod membership;
pub mod role;
pub mod session;
pub mod store;

pub use access::{AccessChange, Requirement};
pub use error::DomainError;
pub use identity::{TeamId, UserId};
pub use membership::{MembershipDirectory, TeamMembership};
pub use role::{Comparison, OrgRole, Role, Scope, ScopedRole, SystemRole, TeamRole};
pub use session::{Clock, InboundRequest, ManualClock, Session, SessionToken, SystemClock};
pub use store::KeyValueStore;
