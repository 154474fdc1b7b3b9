//! Membership infrastructure implementations

mod in_memory;

pub use in_memory::InMemoryMembershipDirectory;
