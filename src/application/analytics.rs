// Streaming anomaly detectors over accepted samples
use crate::domain::sample::Sample;
use crate::domain::thresholds::Thresholds;
use crate::domain::warning::{Warning, WarningKind};
use std::collections::VecDeque;

const FLATLINE_EPSILON: f64 = 1e-6;

/// Per-session rolling state. Only sees samples that already passed validation,
/// in arrival order. Produces warnings, never changes whether a sample is accepted.
#[derive(Debug)]
pub struct AnalyticsEngine {
    thresholds: Thresholds,
    prev_dc_voltage: Option<f64>,
    prev_ac_power: Option<f64>,
    power_window: VecDeque<f64>,
}

impl AnalyticsEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            prev_dc_voltage: None,
            prev_ac_power: None,
            power_window: VecDeque::new(),
        }
    }

    pub fn inspect(&mut self, sample: &Sample) -> Vec<Warning> {
        let mut warnings = Vec::new();

        self.check_dc(sample, &mut warnings);
        self.check_power(sample, &mut warnings);
        self.check_voltage_imbalance(sample, &mut warnings);
        self.check_efficiency(sample, &mut warnings);
        self.check_temperature(sample, &mut warnings);

        warnings
    }

    fn check_dc(&mut self, sample: &Sample, warnings: &mut Vec<Warning>) {
        let row = sample.row_index;
        let dc = sample.dc_voltage.value();

        if let (Some(current), Some(prev)) = (dc, self.prev_dc_voltage) {
            let delta = current - prev;
            if delta.abs() > self.thresholds.dc_sag_delta {
                warnings.push(Warning::new(
                    WarningKind::DcSag,
                    format!(
                        "DC voltage sudden change Δ={:.2} > {}",
                        delta, self.thresholds.dc_sag_delta
                    ),
                    row,
                ));
            }
        }

        let dc_dead = dc.is_none_or(|v| v == 0.0);
        let producing = sample.ac_power.value().is_some_and(|p| p > 0.0);
        if dc_dead && producing {
            warnings.push(Warning::new(
                WarningKind::DcFault,
                "DC voltage missing or zero while AC power > 0",
                row,
            ));
        }

        if dc.is_some() {
            self.prev_dc_voltage = dc;
        }
    }

    fn check_power(&mut self, sample: &Sample, warnings: &mut Vec<Warning>) {
        let Some(power) = sample.ac_power.value() else {
            return;
        };
        let row = sample.row_index;

        if let Some(prev) = self.prev_ac_power.filter(|p| *p > 0.0) {
            let delta = (power - prev).abs();
            let limit = prev * self.thresholds.power_spike_threshold;
            if delta > limit {
                warnings.push(Warning::new(
                    WarningKind::PowerSpike,
                    format!("Power spike Δ={:.2} > {:.2}", delta, limit),
                    row,
                ));
            }
        }

        let window = self.thresholds.power_flatline_window;
        self.power_window.push_back(power);
        while self.power_window.len() > window {
            self.power_window.pop_front();
        }

        // a zero-sized window disables the detector
        if window > 0 && self.power_window.len() == window && self.window_is_flat() {
            warnings.push(Warning::new(
                WarningKind::PowerFlatline,
                format!("Power flatline over {} samples", window),
                row,
            ));
        }

        self.prev_ac_power = Some(power);
    }

    fn window_is_flat(&self) -> bool {
        match self.power_window.front() {
            Some(first) => self
                .power_window
                .iter()
                .all(|p| (p - first).abs() < FLATLINE_EPSILON),
            None => false,
        }
    }

    fn check_voltage_imbalance(&self, sample: &Sample, warnings: &mut Vec<Warning>) {
        let Some(voltages) = sample.line_voltages() else {
            return;
        };

        let avg = voltages.iter().sum::<f64>() / voltages.len() as f64;
        let max = voltages.iter().copied().fold(f64::MIN, f64::max);
        let min = voltages.iter().copied().fold(f64::MAX, f64::min);
        let imbalance_pct = (max - min) / avg * 100.0;

        if imbalance_pct > self.thresholds.voltage_imbalance_pct {
            warnings.push(Warning::new(
                WarningKind::VoltageImbalance,
                format!(
                    "Voltage imbalance {:.2}% > {}%",
                    imbalance_pct, self.thresholds.voltage_imbalance_pct
                ),
                sample.row_index,
            ));
        }
    }

    fn check_efficiency(&self, sample: &Sample, warnings: &mut Vec<Warning>) {
        let (Some(power), Some(voltage), Some(current)) = (
            sample.ac_power.value(),
            sample.ac_voltage.value(),
            sample.ac_current.value(),
        ) else {
            return;
        };
        if voltage <= 0.0 {
            return;
        }

        let apparent = voltage * current;
        if apparent <= 0.0 {
            return;
        }

        let ratio = power / apparent;
        if ratio < self.thresholds.low_efficiency_ratio {
            warnings.push(Warning::new(
                WarningKind::LowEfficiency,
                format!(
                    "Low efficiency ratio={:.2} < {}",
                    ratio, self.thresholds.low_efficiency_ratio
                ),
                sample.row_index,
            ));
        }
    }

    fn check_temperature(&self, sample: &Sample, warnings: &mut Vec<Warning>) {
        if let Some(temp) = sample.temperature.value() {
            if temp > self.thresholds.over_temp_threshold {
                warnings.push(Warning::new(
                    WarningKind::OverTemperature,
                    format!(
                        "Over temperature {:.1} > {}",
                        temp, self.thresholds.over_temp_threshold
                    ),
                    sample.row_index,
                ));
            }
        }
    }
}
