use crate::application::threshold_provider::ThresholdProvider;
use crate::domain::thresholds::{
    DEFAULT_DC_SAG_DELTA, DEFAULT_LOW_EFFICIENCY_RATIO, DEFAULT_OVER_TEMP_THRESHOLD,
    DEFAULT_POWER_FLATLINE_WINDOW, DEFAULT_POWER_SPIKE_THRESHOLD, DEFAULT_VOLTAGE_IMBALANCE_PCT,
    Thresholds,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

const SERVER_ENV_PREFIX: &str = "SOLAR";
const THRESHOLD_ENV_PREFIX: &str = "SOLAR_THRESHOLDS";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8088".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("Data")
}

/// `config/server.*` if present, overridden by `SOLAR_SERVER__BIND_ADDR` style variables
pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    server_config_from(server_environment())
}

fn server_environment() -> config::Environment {
    config::Environment::with_prefix(SERVER_ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn server_config_from(env: config::Environment) -> anyhow::Result<ServerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(env)
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn threshold_environment() -> config::Environment {
    config::Environment::with_prefix(THRESHOLD_ENV_PREFIX).prefix_separator("_")
}

/// Reads the named threshold options from `config/thresholds.*` and
/// `SOLAR_THRESHOLDS_*` variables each time a session starts.
#[derive(Debug, Clone)]
pub struct FileThresholdProvider {
    base_name: String,
}

impl FileThresholdProvider {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
        }
    }

    fn load_with(&self, env: config::Environment) -> Thresholds {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&self.base_name).required(false))
            .add_source(env)
            .build();

        match settings {
            Ok(settings) => thresholds_from_settings(&settings),
            Err(e) => {
                tracing::warn!("Could not read thresholds from {}, using defaults: {}", self.base_name, e);
                Thresholds::default()
            }
        }
    }
}

impl Default for FileThresholdProvider {
    fn default() -> Self {
        Self::new("config/thresholds")
    }
}

impl ThresholdProvider for FileThresholdProvider {
    fn load(&self) -> Thresholds {
        self.load_with(threshold_environment())
    }
}

pub fn thresholds_from_settings(settings: &config::Config) -> Thresholds {
    Thresholds {
        over_temp_threshold: read_or(settings, "OverTempThreshold", DEFAULT_OVER_TEMP_THRESHOLD),
        voltage_imbalance_pct: read_or(settings, "VoltageImbalancePct", DEFAULT_VOLTAGE_IMBALANCE_PCT),
        power_flatline_window: read_or(settings, "PowerFlatlineWindow", DEFAULT_POWER_FLATLINE_WINDOW),
        power_spike_threshold: read_or(settings, "PowerSpikeThreshold", DEFAULT_POWER_SPIKE_THRESHOLD),
        dc_sag_delta: read_or(settings, "DcSagDelta", DEFAULT_DC_SAG_DELTA),
        low_efficiency_ratio: read_or(settings, "LowEfficiencyRatio", DEFAULT_LOW_EFFICIENCY_RATIO),
    }
}

/// Environment sources lowercase their keys, so both spellings are tried
fn read_or<T: FromStr>(settings: &config::Config, key: &str, default: T) -> T {
    let raw = settings
        .get_string(key)
        .or_else(|_| settings.get_string(&key.to_lowercase()));

    match raw {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparsable threshold, using default");
            default
        }),
        Err(_) => default,
    }
}
