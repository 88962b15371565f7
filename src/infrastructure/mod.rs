// Infrastructure layer - Configuration and file-backed adapters
pub mod config;
pub mod csv_sink;
