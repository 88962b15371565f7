// Analytics warning model
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    DcSag,
    DcFault,
    PowerSpike,
    PowerFlatline,
    VoltageImbalance,
    LowEfficiency,
    OverTemperature,
}

impl WarningKind {
    /// Category name as it appears in GetWarnings lines
    pub fn label(&self) -> &'static str {
        match self {
            WarningKind::DcSag => "DCSagWarning",
            WarningKind::DcFault => "DcFaultWarning",
            WarningKind::PowerSpike => "PowerSpikeWarning",
            WarningKind::PowerFlatline => "PowerFlatlineWarning",
            WarningKind::VoltageImbalance => "VoltageImbalanceWarning",
            WarningKind::LowEfficiency => "LowEfficiencyWarning",
            WarningKind::OverTemperature => "OverTempWarning",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub row_index: i64,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>, row_index: i64) -> Self {
        Self {
            kind,
            message: message.into(),
            row_index,
        }
    }
}

/// The line handed back by GetWarnings
impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (Row {})", self.kind, self.message, self.row_index)
    }
}
