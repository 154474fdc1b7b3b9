//! Endpoints operating on the caller's own session

use axum::{extract::State, routing::{get, post}, Router};
use tracing::debug;

use super::middleware::CurrentSession;
use super::state::AppState;
use super::types::{
    AccessCheckParams, AccessCheckResponse, ApiError, Json, LogoutResponse, Query,
    SessionResponse,
};
use crate::domain::access::policy;

pub fn create_session_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/logout", post(logout))
        .route("/access", get(check_access))
}

/// GET /session
pub async fn get_session(current: CurrentSession) -> Result<Json<SessionResponse>, ApiError> {
    let session = current.get().await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /session/logout
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<LogoutResponse>, ApiError> {
    if let Some(session) = current.take().await {
        state
            .sessions
            .destroy_session(session.token().as_str())
            .await?;
    }

    Ok(Json(LogoutResponse { success: true }))
}

/// GET /session/access?role=...&scope=...&entity=...&exact=...
pub async fn check_access(
    current: CurrentSession,
    Query(params): Query<AccessCheckParams>,
) -> Result<Json<AccessCheckResponse>, ApiError> {
    let requirement = params.requirement()?;
    let session = current.get().await?;
    let granted = policy::check(&session, &requirement)?;

    debug!(
        user_id = %session.user_id(),
        role = %requirement.role(),
        entity = ?requirement.entity(),
        granted,
        "Evaluated access requirement"
    );

    Ok(Json(AccessCheckResponse {
        role: requirement.role().to_string(),
        entity: requirement.entity(),
        exact: requirement.is_exact(),
        granted,
    }))
}
