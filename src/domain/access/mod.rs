//! Access domain - role requirements, their evaluation, and role changes

pub mod policy;
mod requirement;

pub use policy::{
    apply_change, check, check_all, check_any, require, require_all, require_any, revoke_team,
};
pub use requirement::{AccessChange, Requirement};
