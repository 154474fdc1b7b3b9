//! Infrastructure layer - Store backends, services, and observability

pub mod auth;
pub mod logging;
pub mod membership;
pub mod observability;
pub mod store;
