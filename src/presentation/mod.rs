// Presentation layer - HTTP transport for the session engine
pub mod app_state;
pub mod handlers;
pub mod router;
