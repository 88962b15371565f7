// Domain layer - Session data models and pure rules
pub mod sample;
pub mod session;
pub mod thresholds;
pub mod validation;
pub mod warning;
