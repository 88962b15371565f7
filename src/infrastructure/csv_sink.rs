// CSV file sink - Accepted and rejected rows, one directory per plant and day
use crate::application::session_sink::{SessionSink, SinkError, SinkFactory};
use crate::domain::sample::Sample;
use crate::domain::session::SessionMeta;
use crate::domain::validation::Rejection;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

pub const ACCEPTED_HEADER: &str =
    "RowIndex,Day,Hour,AcPwrt,DcVolt,Temper,Vl1to2,Vl2to3,Vl3to1,AcCur1,AcVlt1";
pub const REJECTED_HEADER: &str = "RowIndex,Reason,Raw";

const ACCEPTED_FILE: &str = "session.csv";
const REJECTED_FILE: &str = "rejects.csv";

#[derive(Debug, Clone)]
pub struct CsvSinkFactory {
    data_dir: PathBuf,
}

impl CsvSinkFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `<data_dir>/<plant>/<yyyy-MM-dd>`
    pub fn session_dir(&self, plant_id: &str, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(path_segment(plant_id))
            .join(date.format("%Y-%m-%d").to_string())
    }
}

#[async_trait]
impl SinkFactory for CsvSinkFactory {
    async fn open(&self, meta: &SessionMeta, date: NaiveDate) -> Result<Box<dyn SessionSink>, SinkError> {
        let dir = self.session_dir(&meta.plant_id, date);
        fs::create_dir_all(&dir).await.map_err(|source| SinkError::Open {
            path: dir.clone(),
            source,
        })?;

        let accepted = CsvLog::create(dir.join(ACCEPTED_FILE), ACCEPTED_HEADER).await?;
        let rejected = CsvLog::create(dir.join(REJECTED_FILE), REJECTED_HEADER).await?;

        tracing::info!("Opened session logs in {}", dir.display());
        Ok(Box::new(CsvSessionSink { accepted, rejected }))
    }
}

pub struct CsvSessionSink {
    accepted: CsvLog,
    rejected: CsvLog,
}

#[async_trait]
impl SessionSink for CsvSessionSink {
    async fn record_accepted(&mut self, sample: &Sample) -> Result<(), SinkError> {
        self.accepted.append_line(&accepted_line(sample)).await
    }

    async fn record_rejected(&mut self, sample: &Sample, reason: &Rejection) -> Result<(), SinkError> {
        let line = format!(
            "{},{},{}",
            sample.row_index,
            quote(&reason.to_string()),
            quote(&sample.raw_dump())
        );
        self.rejected.append_line(&line).await
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        // close both even if the first one fails
        let accepted = self.accepted.close().await;
        let rejected = self.rejected.close().await;
        accepted.and(rejected)
    }
}

struct CsvLog {
    path: PathBuf,
    file: Option<File>,
}

impl CsvLog {
    /// Truncates whatever was there and writes the header
    async fn create(path: PathBuf, header: &str) -> Result<Self, SinkError> {
        let file = File::create(&path).await.map_err(|source| SinkError::Open {
            path: path.clone(),
            source,
        })?;

        let mut log = Self {
            path,
            file: Some(file),
        };
        log.append_line(header).await?;
        Ok(log)
    }

    async fn append_line(&mut self, line: &str) -> Result<(), SinkError> {
        let Some(file) = self.file.as_mut() else {
            return Err(SinkError::Closed);
        };

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let result = match file.write_all(buf.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        result.map_err(|source| write_error(&self.path, source))
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        match self.file.take() {
            Some(mut file) => file
                .flush()
                .await
                .map_err(|source| write_error(&self.path, source)),
            None => Ok(()),
        }
    }
}

fn write_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Write {
        path: path.to_path_buf(),
        source,
    }
}

fn accepted_line(s: &Sample) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{}",
        s.row_index,
        s.day,
        s.hour,
        s.ac_power,
        s.dc_voltage,
        s.temperature,
        s.vl1to2,
        s.vl2to3,
        s.vl3to1,
        s.ac_current,
        s.ac_voltage,
    )
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Keeps a plant id inside a single directory level
fn path_segment(plant_id: &str) -> String {
    let cleaned: String = plant_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}
