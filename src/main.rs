// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::application::events::SessionEvent;
use crate::application::session_service::SessionEngine;
use crate::infrastructure::config::{FileThresholdProvider, load_server_config};
use crate::infrastructure::csv_sink::CsvSinkFactory;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let server_config = load_server_config()?;

    // Create storage and threshold sources (infrastructure layer)
    let sinks = Arc::new(CsvSinkFactory::new(server_config.server.data_dir.clone()));
    let thresholds = Arc::new(FileThresholdProvider::default());

    // Create the session engine (application layer)
    let session_engine = Arc::new(SessionEngine::new(sinks, thresholds));
    tokio::spawn(log_session_events(session_engine.subscribe()));

    let state = Arc::new(AppState {
        session_engine: session_engine.clone(),
    });
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = server_config.server.bind_addr.parse()?;
    tracing::info!(
        data_dir = %server_config.server.data_dir.display(),
        "Starting solar-telemetry service on {}",
        addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // leave an interrupted session's logs flushed and closed
    let ack = session_engine.abort_session("service shutting down").await;
    if ack.success {
        tracing::warn!(accepted = ack.accepted_count, "Active session aborted on shutdown");
    }
    tracing::info!("Service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Console view of the session lifecycle
async fn log_session_events(mut rx: broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::TransferStarted { plant_id, row_limit }) => {
                tracing::info!(%plant_id, row_limit, "Transfer started");
            }
            Ok(SessionEvent::SampleReceived { accepted_count, .. }) => {
                tracing::debug!("Sample received: {} total", accepted_count);
            }
            Ok(SessionEvent::SampleRejected { row_index, reason }) => {
                tracing::info!(row_index, "Sample rejected: {}", reason);
            }
            Ok(SessionEvent::WarningRaised { warning }) => {
                tracing::info!("[WARNING] {}", warning);
            }
            Ok(SessionEvent::TransferCompleted {
                accepted_count,
                percent_of_limit,
            }) => {
                tracing::info!(accepted_count, percent_of_limit, "Transfer completed");
            }
            Ok(SessionEvent::SessionAborted { reason }) => {
                tracing::warn!("Session aborted: {}", reason);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
