//! API request and response types

pub mod admin;
pub mod error;
pub mod json;
pub mod query;
pub mod session;

pub use admin::{RoleChangeRequest, RoleChangeResponse, SessionEntry};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use query::Query;
pub use session::{AccessCheckParams, AccessCheckResponse, LogoutResponse, SessionResponse};
