use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::admin::{self, ADMIN_ROLES};
use super::health;
use super::middleware::{session_middleware, SessionGuard};
use super::session;
use super::state::AppState;
use super::types::ApiError;

/// Create the full router with application state
///
/// `/health` and `/ready` are public. Everything under `/session` needs a
/// valid session, `/admin` additionally a global administrator.
pub fn create_router(state: AppState) -> Router {
    let guard = SessionGuard::new(state.sessions.clone());

    let session_routes = session::create_session_router()
        .route_layer(from_fn_with_state(guard.clone(), session_middleware));
    let admin_routes = admin::create_admin_router().route_layer(from_fn_with_state(
        guard.restrict_to(ADMIN_ROLES),
        session_middleware,
    ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .nest("/session", session_routes)
        .nest("/admin", admin_routes)
        .fallback(|| async { ApiError::not_found() })
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
