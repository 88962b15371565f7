// Photovoltaic sample domain model
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved channel value meaning "no reading"
pub const SENTINEL: f64 = 32767.0;
const SENTINEL_TOLERANCE: f64 = 1e-9;

/// One optional channel value. Missing is distinct from zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Reading {
    Present(f64),
    #[default]
    Missing,
}

impl Reading {
    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Present(v) => Some(v),
            Reading::Missing => None,
        }
    }

    /// Map the sentinel code to Missing, pass everything else through
    pub fn normalized(self) -> Self {
        match self {
            Reading::Present(v) if (v - SENTINEL).abs() < SENTINEL_TOLERANCE => Reading::Missing,
            other => other,
        }
    }
}

impl From<Option<f64>> for Reading {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Reading::Missing, Reading::Present)
    }
}

impl From<Reading> for Option<f64> {
    fn from(reading: Reading) -> Self {
        reading.value()
    }
}

/// Renders the shortest representation that parses back to the same f64;
/// Missing renders as an empty field.
impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Present(v) => write!(f, "{}", v),
            Reading::Missing => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub row_index: i64,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub hour: String,
    #[serde(default)]
    pub ac_power: Reading,
    #[serde(default)]
    pub dc_voltage: Reading,
    #[serde(default)]
    pub temperature: Reading,
    #[serde(default)]
    pub vl1to2: Reading,
    #[serde(default)]
    pub vl2to3: Reading,
    #[serde(default)]
    pub vl3to1: Reading,
    #[serde(default)]
    pub ac_current: Reading,
    #[serde(default)]
    pub ac_voltage: Reading,
}

impl Sample {
    /// Copy of this sample with every sentinel channel replaced by Missing
    pub fn normalized(&self) -> Sample {
        Sample {
            row_index: self.row_index,
            day: self.day.clone(),
            hour: self.hour.clone(),
            ac_power: self.ac_power.normalized(),
            dc_voltage: self.dc_voltage.normalized(),
            temperature: self.temperature.normalized(),
            vl1to2: self.vl1to2.normalized(),
            vl2to3: self.vl2to3.normalized(),
            vl3to1: self.vl3to1.normalized(),
            ac_current: self.ac_current.normalized(),
            ac_voltage: self.ac_voltage.normalized(),
        }
    }

    /// Field dump used in the reject log, e.g. `Day=2023-12-1;Hour=00:05:00;AcPwrt=;...`
    pub fn raw_dump(&self) -> String {
        format!(
            "Day={};Hour={};AcPwrt={};DcVolt={};Temper={};Vl1to2={};Vl2to3={};Vl3to1={};AcCur1={};AcVlt1={}",
            self.day,
            self.hour,
            self.ac_power,
            self.dc_voltage,
            self.temperature,
            self.vl1to2,
            self.vl2to3,
            self.vl3to1,
            self.ac_current,
            self.ac_voltage,
        )
    }

    pub fn line_voltages(&self) -> Option<[f64; 3]> {
        Some([
            self.vl1to2.value()?,
            self.vl2to3.value()?,
            self.vl3to1.value()?,
        ])
    }
}
