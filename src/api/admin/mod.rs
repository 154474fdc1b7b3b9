//! Administrative endpoints over all live sessions
//!
//! Mounted behind a session guard restricted to global administrators.

use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Router,
};
use tracing::info;

use super::middleware::CurrentSession;
use super::state::AppState;
use super::types::{ApiError, Json, RoleChangeRequest, RoleChangeResponse, SessionEntry};
use crate::domain::{SystemRole, TeamId, UserId};

/// Roles allowed through the admin guard
pub const ADMIN_ROLES: &[SystemRole] = &[SystemRole::GlobalAdmin];

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/users/{user_id}/roles", put(change_role))
        .route("/users/{user_id}/teams/{team_id}", delete(revoke_team))
}

/// GET /admin/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionEntry>>, ApiError> {
    let sessions = state.sessions.list_sessions().await?;
    Ok(Json(sessions.iter().map(SessionEntry::from).collect()))
}

/// PUT /admin/users/{user_id}/roles
///
/// Rewrites the role in every live session of the user. The caller's own
/// working copy is updated too, so the end-of-request save keeps the change.
pub async fn change_role(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(user_id): Path<i64>,
    Json(request): Json<RoleChangeRequest>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let user = UserId::new(user_id);
    let change = request.into_change()?;

    let mut working = current.lock().await;
    let summary = state
        .access
        .refresh_user_access(user, &change, working.as_mut())
        .await?;

    info!(user_id = %user, kind = change.kind(), "Changed user role");
    Ok(Json(summary.into()))
}

/// DELETE /admin/users/{user_id}/teams/{team_id}
pub async fn revoke_team(
    State(state): State<AppState>,
    current: CurrentSession,
    Path((user_id, team_id)): Path<(i64, i64)>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let user = UserId::new(user_id);
    let team = TeamId::new(team_id);

    let mut working = current.lock().await;
    let summary = state
        .access
        .revoke_user_access(user, team, working.as_mut())
        .await?;

    info!(user_id = %user, team_id = %team, "Revoked team access");
    Ok(Json(summary.into()))
}
