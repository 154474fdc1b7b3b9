//! API middleware components

pub mod client_ip;
pub mod session_auth;

pub use client_ip::resolve_client_ip;
pub use session_auth::{session_middleware, CurrentSession, SessionGuard};
