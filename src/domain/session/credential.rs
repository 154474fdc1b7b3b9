//! Inbound credential parsing

use crate::domain::role::SystemRole;
use crate::domain::DomainError;

const BEARER_SCHEME: &str = "bearer";

/// What the authentication engine needs to know about an inbound request
#[derive(Debug, Clone, Copy)]
pub struct InboundRequest<'a> {
    pub authorization: Option<&'a str>,
    pub client_ip: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    /// System roles of which at least one must be held; empty means no limit
    pub access_limit: &'a [SystemRole],
}

impl<'a> InboundRequest<'a> {
    pub fn new(client_ip: &'a str, method: &'a str, path: &'a str) -> Self {
        Self {
            authorization: None,
            client_ip,
            method,
            path,
            access_limit: &[],
        }
    }

    pub fn with_authorization(mut self, header: Option<&'a str>) -> Self {
        self.authorization = header;
        self
    }

    pub fn with_access_limit(mut self, roles: &'a [SystemRole]) -> Self {
        self.access_limit = roles;
        self
    }

    /// CORS pre-flight requests never carry credentials
    pub fn is_preflight(&self) -> bool {
        self.method.eq_ignore_ascii_case("OPTIONS")
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
///
/// The value must be exactly two space separated parts, the scheme is matched
/// case-insensitively.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, DomainError> {
    let header = header.ok_or(DomainError::NoCredential)?;
    let mut parts = header.split(' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(DomainError::MalformedCredential),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let token = extract_bearer_token(Some("Bearer 6f1c7a0e-1b4a")).unwrap();
        assert_eq!(token, "6f1c7a0e-1b4a");

        let token = extract_bearer_token(Some("BEARER abc")).unwrap();
        assert_eq!(token, "abc");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            extract_bearer_token(None),
            Err(DomainError::NoCredential)
        ));
    }

    #[test]
    fn test_malformed_headers() {
        for header in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "Bearer a b", "token"] {
            assert!(
                matches!(
                    extract_bearer_token(Some(header)),
                    Err(DomainError::MalformedCredential)
                ),
                "header {:?} should be malformed",
                header
            );
        }
    }

    #[test]
    fn test_preflight_detection() {
        assert!(InboundRequest::new("1.2.3.4", "options", "/session").is_preflight());
        assert!(!InboundRequest::new("1.2.3.4", "GET", "/session").is_preflight());
    }
}
