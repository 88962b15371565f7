// Persistence traits for per-session accept/reject logs
use crate::domain::sample::Sample;
use crate::domain::session::SessionMeta;
use crate::domain::validation::Rejection;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sink already closed")]
    Closed,
}

/// Opens the two append-only logs of a session, truncating anything left from a previous run
#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn open(&self, meta: &SessionMeta, date: NaiveDate) -> Result<Box<dyn SessionSink>, SinkError>;
}

/// Every write must be durable (flushed) before it returns
#[async_trait]
pub trait SessionSink: Send {
    /// Append a normalized, accepted sample
    async fn record_accepted(&mut self, sample: &Sample) -> Result<(), SinkError>;

    /// Append a rejected sample. Rows that reached validation arrive normalized;
    /// ordering and limit rejects arrive as submitted.
    async fn record_rejected(&mut self, sample: &Sample, reason: &Rejection) -> Result<(), SinkError>;

    /// Flush and release both logs. Further writes fail with `SinkError::Closed`.
    async fn close(&mut self) -> Result<(), SinkError>;
}
