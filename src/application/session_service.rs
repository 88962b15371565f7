// Session engine - Single-session ingest state machine
use crate::application::analytics::AnalyticsEngine;
use crate::application::events::{EventPublisher, SessionEvent};
use crate::application::session_sink::{SessionSink, SinkError, SinkFactory};
use crate::application::threshold_provider::ThresholdProvider;
use crate::domain::sample::Sample;
use crate::domain::session::{Ack, SessionMeta, percent_of_limit};
use crate::domain::validation::{Rejection, validate};
use crate::domain::warning::Warning;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};

/// Lower than any row index a client can legitimately send
const NO_ROW_ACCEPTED: i64 = -1;
const NOT_STARTED: &str = "Session not started";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Active,
    Faulted,
}

struct ActiveSession {
    meta: SessionMeta,
    last_row_index: i64,
    accepted_count: u64,
    sink: Box<dyn SessionSink>,
    analytics: AnalyticsEngine,
}

impl ActiveSession {
    fn ack(&self, message: &str) -> Ack {
        Ack::ok(message, self.accepted_count, self.meta.row_limit)
    }
}

enum SessionState {
    Idle,
    Active(ActiveSession),
    Faulted,
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Active(_) => SessionPhase::Active,
            SessionState::Faulted => SessionPhase::Faulted,
        }
    }
}

/// Owns the one active session. Start, push and end are serialized through `state`;
/// the warning list has its own lock so readers never wait on sink I/O.
pub struct SessionEngine {
    sinks: Arc<dyn SinkFactory>,
    thresholds: Arc<dyn ThresholdProvider>,
    state: Mutex<SessionState>,
    warnings: RwLock<Vec<Warning>>,
    events: EventPublisher,
}

impl SessionEngine {
    pub fn new(sinks: Arc<dyn SinkFactory>, thresholds: Arc<dyn ThresholdProvider>) -> Self {
        Self {
            sinks,
            thresholds,
            state: Mutex::new(SessionState::Idle),
            warnings: RwLock::new(Vec::new()),
            events: EventPublisher::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase()
    }

    pub async fn start_session(&self, meta: Option<SessionMeta>) -> Ack {
        let Some(meta) = meta else {
            return Ack::failure("Meta is null");
        };

        let mut state = self.state.lock().await;
        if let SessionState::Active(mut previous) =
            std::mem::replace(&mut *state, SessionState::Idle)
        {
            tracing::warn!(
                plant_id = %previous.meta.plant_id,
                accepted = previous.accepted_count,
                "Discarding unfinished session"
            );
            if let Err(e) = previous.sink.close().await {
                tracing::warn!("Failed to close previous session storage: {}", e);
            }
        }

        let thresholds = self.thresholds.load();
        let date = meta.resolved_date();
        let sink = match self.sinks.open(&meta, date).await {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!(plant_id = %meta.plant_id, "Failed to open session storage: {}", e);
                return Ack::failure(format!("Failed to open session storage: {}", e));
            }
        };

        self.warnings.write().await.clear();

        tracing::info!(
            plant_id = %meta.plant_id,
            file_name = %meta.file_name,
            total_rows = meta.total_rows,
            schema_version = %meta.schema_version,
            row_limit = meta.row_limit,
            %date,
            "Session started"
        );
        tracing::debug!(?thresholds, "Session thresholds");

        let session = ActiveSession {
            last_row_index: NO_ROW_ACCEPTED,
            accepted_count: 0,
            sink,
            analytics: AnalyticsEngine::new(thresholds),
            meta,
        };
        let ack = session.ack("Session started");

        self.events.publish(SessionEvent::TransferStarted {
            plant_id: session.meta.plant_id.clone(),
            row_limit: session.meta.row_limit,
        });
        *state = SessionState::Active(session);

        ack
    }

    /// Domain rejections still produce a successful ack; callers watch the
    /// accepted count (or the reject log) to notice dropped rows.
    pub async fn push_sample(&self, sample: Option<Sample>) -> Ack {
        let mut state = self.state.lock().await;

        let outcome = match &mut *state {
            SessionState::Active(session) => {
                let Some(sample) = sample else {
                    return Ack::failure("Sample is null");
                };
                self.process(session, sample)
                    .await
                    .map(|()| session.ack("OK"))
            }
            _ => return Ack::failure(NOT_STARTED),
        };

        match outcome {
            Ok(ack) => ack,
            Err(e) => self.fault(&mut state, format!("Session storage failure: {}", e)).await,
        }
    }

    pub async fn end_session(&self) -> Ack {
        let mut state = self.state.lock().await;

        let mut session = match std::mem::replace(&mut *state, SessionState::Idle) {
            SessionState::Active(session) => session,
            other => {
                *state = other;
                return Ack::failure(NOT_STARTED);
            }
        };

        if let Err(e) = session.sink.close().await {
            *state = SessionState::Faulted;
            tracing::error!(plant_id = %session.meta.plant_id, "Failed to close session storage: {}", e);
            let reason = format!("Session storage failure: {}", e);
            self.events.publish(SessionEvent::SessionAborted {
                reason: reason.clone(),
            });
            return Ack::failure(reason);
        }

        let ack = session.ack("Session completed");
        tracing::info!(
            plant_id = %session.meta.plant_id,
            accepted = ack.accepted_count,
            percent = ack.percent_of_limit,
            "Session completed"
        );
        self.events.publish(SessionEvent::TransferCompleted {
            accepted_count: ack.accepted_count,
            percent_of_limit: ack.percent_of_limit,
        });

        ack
    }

    /// Abrupt teardown, e.g. the transport went away. Logs are flushed and
    /// closed; accumulated warnings stay readable.
    pub async fn abort_session(&self, reason: &str) -> Ack {
        let mut state = self.state.lock().await;
        let (accepted_count, row_limit) = match &*state {
            SessionState::Active(session) => (session.accepted_count, session.meta.row_limit),
            _ => return Ack::failure(NOT_STARTED),
        };

        self.fault(&mut state, reason.to_string()).await;
        Ack::ok("Session aborted", accepted_count, row_limit)
    }

    /// Snapshot of the warnings raised since the last session start
    pub async fn warnings(&self) -> Vec<String> {
        self.warnings
            .read()
            .await
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    async fn process(&self, session: &mut ActiveSession, sample: Sample) -> Result<(), SinkError> {
        if sample.row_index <= session.last_row_index {
            let rejection = Rejection::NonMonotonic {
                last: session.last_row_index,
            };
            return self.reject(session, &sample, rejection).await;
        }
        if session.accepted_count >= session.meta.row_limit {
            let rejection = Rejection::LimitReached {
                limit: session.meta.row_limit,
            };
            return self.reject(session, &sample, rejection).await;
        }

        let normalized = sample.normalized();
        if let Err(rejection) = validate(&normalized) {
            return self.reject(session, &normalized, rejection).await;
        }

        // held back until the row is on disk, so a failed write leaves no orphan warnings
        let warnings = session.analytics.inspect(&normalized);
        session.sink.record_accepted(&normalized).await?;
        session.last_row_index = normalized.row_index;
        session.accepted_count += 1;
        self.raise(warnings).await;

        tracing::info!(
            row_index = normalized.row_index,
            accepted = session.accepted_count,
            percent = percent_of_limit(session.accepted_count, session.meta.row_limit),
            "Transfer in progress"
        );
        self.events.publish(SessionEvent::SampleReceived {
            row_index: normalized.row_index,
            accepted_count: session.accepted_count,
        });

        Ok(())
    }

    async fn reject(
        &self,
        session: &mut ActiveSession,
        sample: &Sample,
        rejection: Rejection,
    ) -> Result<(), SinkError> {
        session.sink.record_rejected(sample, &rejection).await?;

        tracing::debug!(row_index = sample.row_index, reason = %rejection, "Sample rejected");
        self.events.publish(SessionEvent::SampleRejected {
            row_index: sample.row_index,
            reason: rejection.to_string(),
        });

        Ok(())
    }

    async fn raise(&self, warnings: Vec<Warning>) {
        if warnings.is_empty() {
            return;
        }

        let mut list = self.warnings.write().await;
        for warning in warnings {
            tracing::warn!(kind = %warning.kind, row_index = warning.row_index, "{}", warning.message);
            self.events.publish(SessionEvent::WarningRaised {
                warning: warning.clone(),
            });
            list.push(warning);
        }
    }

    async fn fault(&self, state: &mut SessionState, reason: String) -> Ack {
        if let SessionState::Active(mut session) = std::mem::replace(state, SessionState::Faulted) {
            if let Err(e) = session.sink.close().await {
                tracing::warn!("Failed to close session storage: {}", e);
            }
            tracing::error!(
                plant_id = %session.meta.plant_id,
                accepted = session.accepted_count,
                "Session faulted: {}",
                reason
            );
        }

        self.events.publish(SessionEvent::SessionAborted {
            reason: reason.clone(),
        });
        Ack::failure(reason)
    }
}
