// Application state for HTTP handlers
use crate::application::session_service::SessionEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub session_engine: Arc<SessionEngine>,
}
