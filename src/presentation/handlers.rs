// HTTP request handlers
use crate::application::session_service::SessionPhase;
use crate::domain::sample::Sample;
use crate::domain::session::{Ack, SessionMeta};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub phase: SessionPhase,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Body may be `null`, which is reported back as a failed ack
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(meta): Json<Option<SessionMeta>>,
) -> Json<Ack> {
    Json(state.session_engine.start_session(meta).await)
}

pub async fn push_sample(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<Option<Sample>>,
) -> Json<Ack> {
    Json(state.session_engine.push_sample(sample).await)
}

pub async fn end_session(State(state): State<Arc<AppState>>) -> Json<Ack> {
    Json(state.session_engine.end_session().await)
}

/// Client is giving up on the transfer; flush and close what was written so far
pub async fn abort_session(State(state): State<Arc<AppState>>) -> Json<Ack> {
    Json(state.session_engine.abort_session("aborted by client").await)
}

pub async fn session_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        phase: state.session_engine.phase().await,
    })
}

pub async fn get_warnings(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.session_engine.warnings().await)
}

/// Lifecycle and warning events as they happen. Slow subscribers skip what they missed.
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.session_engine.subscribe()).filter_map(|msg| match msg {
        Ok(event) => match Event::default().json_data(&event) {
            Ok(sse_event) => Some(Ok::<_, Infallible>(sse_event)),
            Err(e) => {
                tracing::warn!("Failed to encode session event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Event subscriber lagged behind");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use crate::application::session_service::SessionEngine;
    use crate::domain::session::Ack;
    use crate::domain::thresholds::Thresholds;
    use crate::infrastructure::csv_sink::CsvSinkFactory;
    use crate::presentation::app_state::AppState;
    use crate::presentation::router::build_router;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(data_dir: &std::path::Path) -> Router {
        let engine = SessionEngine::new(
            Arc::new(CsvSinkFactory::new(data_dir)),
            Arc::new(Thresholds::default()),
        );
        build_router(Arc::new(AppState {
            session_engine: Arc::new(engine),
        }))
    }

    async fn call<T: DeserializeOwned>(app: &Router, method: &str, uri: &str, body: Option<&str>) -> T {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let ack: Ack = call(
            &app,
            "POST",
            "/sessions/start",
            Some(r#"{"plant_id":"PLANT-001","file_name":"input.csv","total_rows":3,"schema_version":"1.0","row_limit":4,"session_date":"2023-12-01"}"#),
        )
        .await;
        assert!(ack.success);

        let samples = [
            r#"{"row_index":1,"day":"2023-12-1","hour":"00:05:00","ac_power":10.0,"dc_voltage":300.0,"temperature":80.0}"#,
            r#"{"row_index":1,"day":"2023-12-1","hour":"00:10:00"}"#,
            r#"{"row_index":2,"day":"2023-12-1","hour":"00:10:00","ac_power":32767,"dc_voltage":310.0}"#,
        ];
        for sample in samples {
            let ack: Ack = call(&app, "POST", "/sessions/samples", Some(sample)).await;
            assert!(ack.success);
        }

        let warnings: Vec<String> = call(&app, "GET", "/sessions/warnings", None).await;
        assert_eq!(warnings, vec!["[OverTempWarning] Over temperature 80.0 > 75 (Row 1)"]);

        let status: serde_json::Value = call(&app, "GET", "/sessions/status", None).await;
        assert_eq!(status["phase"], "active");

        let ack: Ack = call(&app, "POST", "/sessions/end", None).await;
        assert!(ack.success);
        assert_eq!(ack.accepted_count, 2);
        assert_eq!(ack.percent_of_limit, 50.0);

        let session_dir = dir.path().join("PLANT-001").join("2023-12-01");
        let accepted = std::fs::read_to_string(session_dir.join("session.csv")).unwrap();
        let lines: Vec<&str> = accepted.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "2,2023-12-1,00:10:00,,310,,,,,,");

        let rejected = std::fs::read_to_string(session_dir.join("rejects.csv")).unwrap();
        assert_eq!(rejected.lines().count(), 2);
        assert!(rejected.contains("RowIndex not monotonic (last=1)"));
    }

    #[tokio::test]
    async fn test_misuse_is_a_failed_ack() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let ack: Ack = call(
            &app,
            "POST",
            "/sessions/samples",
            Some(r#"{"row_index":1,"day":"2023-12-1","hour":"00:05:00"}"#),
        )
        .await;
        assert!(!ack.success);

        let ack: Ack = call(&app, "POST", "/sessions/start", Some("null")).await;
        assert!(!ack.success);
        assert_eq!(ack.message, "Meta is null");

        let ack: Ack = call(&app, "POST", "/sessions/abort", None).await;
        assert!(!ack.success);

        // nothing was written
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
