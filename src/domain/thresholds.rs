// Analytics thresholds, fixed for the lifetime of a session
use serde::{Deserialize, Serialize};

pub const DEFAULT_OVER_TEMP_THRESHOLD: f64 = 75.0;
pub const DEFAULT_VOLTAGE_IMBALANCE_PCT: f64 = 10.0;
pub const DEFAULT_POWER_FLATLINE_WINDOW: usize = 5;
pub const DEFAULT_POWER_SPIKE_THRESHOLD: f64 = 1.5;
pub const DEFAULT_DC_SAG_DELTA: f64 = 50.0;
pub const DEFAULT_LOW_EFFICIENCY_RATIO: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Temperature above which an over-temperature warning is raised
    pub over_temp_threshold: f64,
    /// Line-to-line spread, in percent of the average
    pub voltage_imbalance_pct: f64,
    /// Number of AC power readings kept for flatline detection
    pub power_flatline_window: usize,
    /// Allowed power jump as a multiple of the previous reading
    pub power_spike_threshold: f64,
    pub dc_sag_delta: f64,
    pub low_efficiency_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            over_temp_threshold: DEFAULT_OVER_TEMP_THRESHOLD,
            voltage_imbalance_pct: DEFAULT_VOLTAGE_IMBALANCE_PCT,
            power_flatline_window: DEFAULT_POWER_FLATLINE_WINDOW,
            power_spike_threshold: DEFAULT_POWER_SPIKE_THRESHOLD,
            dc_sag_delta: DEFAULT_DC_SAG_DELTA,
            low_efficiency_ratio: DEFAULT_LOW_EFFICIENCY_RATIO,
        }
    }
}
