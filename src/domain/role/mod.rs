//! Role domain - scoped, ordered roles and the wildcard comparator

mod comparison;
mod entity;

pub use comparison::Comparison;
pub use entity::{OrgRole, Role, Scope, ScopedRole, SystemRole, TeamRole, ANY_ROLE_NAME};
