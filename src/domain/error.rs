use thiserror::Error;

use super::role::Scope;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No authorization header")]
    NoCredential,

    #[error("The authorization header is invalid")]
    MalformedCredential,

    #[error("The session token provided is invalid")]
    InvalidSession,

    #[error("Your session has expired")]
    SessionExpired,

    #[error("The request was sent from a new IP address, please login again")]
    ClientOriginViolation,

    #[error("The access to this function is not allowed for the logged in user")]
    AccessDenied,

    #[error("Unknown {scope} role: '{name}'")]
    UnknownRole { scope: Scope, name: String },

    #[error("Cannot compare a {left} role with a {right} role")]
    ScopeMismatch { left: Scope, right: Scope },

    #[error("An exact role requirement cannot use the {scope} wildcard")]
    ExactWildcard { scope: Scope },

    #[error("Session store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Malformed payload stored under '{key}': {message}")]
    CorruptPayload { key: String, message: String },

    #[error("Membership lookup failed: {message}")]
    MembershipLookup { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn unknown_role(scope: Scope, name: impl Into<String>) -> Self {
        Self::UnknownRole {
            scope,
            name: name.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn corrupt_payload(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptPayload {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn membership_lookup(message: impl Into<String>) -> Self {
        Self::MembershipLookup {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Short, stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::InvalidSession => "invalid_session",
            Self::SessionExpired => "session_expired",
            Self::ClientOriginViolation => "client_origin_violation",
            Self::AccessDenied => "access_denied",
            Self::UnknownRole { .. } => "unknown_role",
            Self::ScopeMismatch { .. } => "scope_mismatch",
            Self::ExactWildcard { .. } => "exact_wildcard",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::CorruptPayload { .. } => "corrupt_payload",
            Self::MembershipLookup { .. } => "membership_lookup",
            Self::Configuration { .. } => "configuration",
        }
    }
}
