//! API error responses
//!
//! Every error carries a numeric code in the body and in the `X-ErrorCode`
//! header so clients can branch without parsing messages.

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const ERROR_CODE_HEADER: HeaderName = HeaderName::from_static("x-errorcode");

/// Numeric error codes exposed to clients
pub mod codes {
    pub const INTERNAL: u16 = 1000;
    pub const NOT_FOUND: u16 = 1001;
    pub const NO_JSON_PAYLOAD: u16 = 1002;
    pub const MALFORMED_PAYLOAD: u16 = 1003;
    pub const BAD_PARAMETER: u16 = 1005;
    pub const NO_CREDENTIAL: u16 = 1101;
    pub const SESSION_EXPIRED: u16 = 1102;
    pub const INVALID_SESSION: u16 = 1103;
    pub const CLIENT_ORIGIN_VIOLATION: u16 = 1104;
    pub const ACCESS_DENIED: u16 = 1105;
    pub const MALFORMED_CREDENTIAL: u16 = 1106;
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "errorCode")]
    pub code: u16,
    #[serde(rename = "errorMessage")]
    pub message: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    code,
                    message: message.into(),
                },
            },
        }
    }

    pub fn code(&self) -> u16 {
        self.response.error.code
    }

    /// Bad query or path parameter
    pub fn bad_parameter(description: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::BAD_PARAMETER,
            format!("Bad Parameter: {}", description),
        )
    }

    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "The requested resource was not found",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, codes::INTERNAL, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = HeaderValue::from(self.code());
        let mut response = (self.status, Json(self.response)).into_response();
        response.headers_mut().insert(ERROR_CODE_HEADER, code);
        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::NoCredential => {
                Self::new(StatusCode::UNAUTHORIZED, codes::NO_CREDENTIAL, message)
            }
            DomainError::SessionExpired => {
                Self::new(StatusCode::UNAUTHORIZED, codes::SESSION_EXPIRED, message)
            }
            DomainError::InvalidSession => {
                Self::new(StatusCode::UNAUTHORIZED, codes::INVALID_SESSION, message)
            }
            DomainError::ClientOriginViolation => Self::new(
                StatusCode::FORBIDDEN,
                codes::CLIENT_ORIGIN_VIOLATION,
                message,
            ),
            DomainError::AccessDenied => {
                Self::new(StatusCode::FORBIDDEN, codes::ACCESS_DENIED, message)
            }
            DomainError::MalformedCredential => {
                Self::new(StatusCode::FORBIDDEN, codes::MALFORMED_CREDENTIAL, message)
            }
            DomainError::UnknownRole { .. } | DomainError::ExactWildcard { .. } => {
                Self::bad_parameter(message)
            }
            DomainError::StoreUnavailable { .. } => {
                tracing::error!(error = %message, "Session store unavailable");
                Self::unavailable("Session store unavailable")
            }
            DomainError::ScopeMismatch { .. }
            | DomainError::CorruptPayload { .. }
            | DomainError::MembershipLookup { .. }
            | DomainError::Configuration { .. } => {
                tracing::error!(error = %message, "Internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::Scope;

    #[test]
    fn test_session_error_codes() {
        let cases = [
            (DomainError::NoCredential, StatusCode::UNAUTHORIZED, 1101),
            (DomainError::SessionExpired, StatusCode::UNAUTHORIZED, 1102),
            (DomainError::InvalidSession, StatusCode::UNAUTHORIZED, 1103),
            (DomainError::ClientOriginViolation, StatusCode::FORBIDDEN, 1104),
            (DomainError::AccessDenied, StatusCode::FORBIDDEN, 1105),
            (DomainError::MalformedCredential, StatusCode::FORBIDDEN, 1106),
        ];

        for (error, status, code) in cases {
            let api_error = ApiError::from(error);
            assert_eq!(api_error.status, status);
            assert_eq!(api_error.code(), code);
        }
    }

    #[test]
    fn test_store_outage_is_503() {
        let api_error = ApiError::from(DomainError::store_unavailable("connection refused"));
        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!api_error.response.error.message.contains("refused"));
    }

    #[test]
    fn test_unknown_role_is_bad_parameter() {
        let api_error = ApiError::from(DomainError::unknown_role(Scope::Team, "team_owner"));
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code(), codes::BAD_PARAMETER);
    }

    #[test]
    fn test_response_carries_code_header() {
        let response = ApiError::from(DomainError::InvalidSession).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("X-ErrorCode").unwrap(), "1103");
    }

    #[test]
    fn test_body_shape() {
        let body = serde_json::to_value(ApiError::from(DomainError::AccessDenied).response).unwrap();
        assert_eq!(body["error"]["errorCode"], 1105);
        assert!(body["error"]["errorMessage"].is_string());
    }
}
