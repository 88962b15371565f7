// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    abort_session, end_session, get_warnings, health_check, push_sample, session_status,
    start_session, stream_events,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/sessions/start", post(start_session))
        .route("/sessions/samples", post(push_sample))
        .route("/sessions/end", post(end_session))
        .route("/sessions/abort", post(abort_session))
        .route("/sessions/status", get(session_status))
        .route("/sessions/warnings", get(get_warnings))
        .route("/events", get(stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
