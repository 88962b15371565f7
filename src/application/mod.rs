// Application layer - Session use cases and the traits they depend on
pub mod analytics;
pub mod events;
pub mod session_service;
pub mod session_sink;
pub mod threshold_provider;
