// Session metadata and acknowledgment models
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub plant_id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub schema_version: String,
    pub row_limit: u64,
    /// Partitions storage; today (UTC) when absent
    #[serde(default)]
    pub session_date: Option<NaiveDate>,
}

impl SessionMeta {
    pub fn resolved_date(&self) -> NaiveDate {
        self.session_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
    pub accepted_count: u64,
    pub percent_of_limit: f64,
}

impl Ack {
    pub fn ok(message: impl Into<String>, accepted_count: u64, row_limit: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            accepted_count,
            percent_of_limit: percent_of_limit(accepted_count, row_limit),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            accepted_count: 0,
            percent_of_limit: 0.0,
        }
    }
}

/// accepted / limit * 100, rounded to 2 decimals. A zero limit counts as complete.
pub fn percent_of_limit(accepted_count: u64, row_limit: u64) -> f64 {
    if row_limit == 0 {
        return 100.0;
    }
    let pct = 100.0 * accepted_count as f64 / row_limit as f64;
    (pct * 100.0).round() / 100.0
}
