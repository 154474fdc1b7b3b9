//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::auth::{AccessService, SessionService};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub access: Arc<AccessService>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionService>, access: Arc<AccessService>) -> Self {
        Self { sessions, access }
    }
}
