//! Session authentication middleware
//!
//! Authenticates the request, hands the working session copy to the handler
//! through request extensions, and writes it back once the handler is done.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

use super::client_ip::resolve_client_ip;
use crate::api::types::ApiError;
use crate::domain::{DomainError, InboundRequest, Session, SystemRole};
use crate::infrastructure::auth::SessionService;

/// Middleware state: the session service plus the route group's access limit
#[derive(Clone)]
pub struct SessionGuard {
    sessions: Arc<SessionService>,
    access_limit: &'static [SystemRole],
}

impl SessionGuard {
    pub fn new(sessions: Arc<SessionService>) -> Self {
        Self {
            sessions,
            access_limit: &[],
        }
    }

    /// Only sessions holding at least one of `roles` get through
    pub fn restrict_to(mut self, roles: &'static [SystemRole]) -> Self {
        self.access_limit = roles;
        self
    }
}

/// Authenticates every request of the guarded routes
pub async fn session_middleware(
    State(guard): State<SessionGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = resolve_client_ip(request.headers(), peer);
    let authorization = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| DomainError::MalformedCredential)?
                .to_string(),
        ),
        None => None,
    };
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    let inbound = InboundRequest::new(&client_ip, &method, &path)
        .with_authorization(authorization.as_deref())
        .with_access_limit(guard.access_limit);

    let Some(session) = guard.sessions.authenticate_request(&inbound).await? else {
        return Ok(next.run(request).await);
    };

    debug!(
        token = session.token().redacted(),
        user_id = %session.user_id(),
        path = %path,
        "Authenticated request"
    );

    let current = CurrentSession::new(session);
    request.extensions_mut().insert(current.clone());

    let response = next.run(request).await;

    if let Some(session) = current.take().await {
        guard.sessions.save_session(&session).await.map_err(|e| {
            error!(token = session.token().redacted(), error = %e, "Failed to save session");
            ApiError::from(e)
        })?;
    }

    Ok(response)
}

/// The request's working session copy
///
/// Shared between the middleware and the handler. A handler that logs the
/// user out takes the session so it is not written back.
#[derive(Clone)]
pub struct CurrentSession(Arc<Mutex<Option<Session>>>);

impl CurrentSession {
    pub fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(Some(session))))
    }

    /// Copy of the working session
    pub async fn get(&self) -> Result<Session, ApiError> {
        self.0
            .lock()
            .await
            .clone()
            .ok_or_else(|| DomainError::InvalidSession.into())
    }

    /// Exclusive access for in-place changes
    pub async fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.0.lock().await
    }

    /// Removes the working copy so nothing is saved at the end of the request
    pub async fn take(&self) -> Option<Session> {
        self.0.lock().await.take()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| DomainError::NoCredential.into())
    }
}
