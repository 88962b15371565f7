// Source of analytics thresholds, consulted once per session start
use crate::domain::thresholds::Thresholds;

pub trait ThresholdProvider: Send + Sync {
    fn load(&self) -> Thresholds;
}

/// Fixed thresholds
impl ThresholdProvider for Thresholds {
    fn load(&self) -> Thresholds {
        self.clone()
    }
}
