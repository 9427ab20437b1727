//! Error types for rota-dashboard

use thiserror::Error;

/// rota-dashboard error type
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DashboardError>;
