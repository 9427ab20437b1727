//! Error types for rota-core

use thiserror::Error;

/// Main error type for rota-core
#[derive(Error, Debug)]
pub enum RotaError {
    /// The backend could not be reached or the request was rejected in transit
    #[error("Network error: {0}")]
    Network(String),

    /// The backend (or local parsing) rejected a selection
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend has nothing for the requested window yet
    #[error("No data: {0}")]
    MissingData(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Day {0} is not editable")]
    NotEditable(chrono::NaiveDate),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RotaError {
    /// Short category used when surfacing the failure to the user
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::Http(_) => "network",
            Self::Validation(_) | Self::NotEditable(_) => "validation",
            Self::MissingData(_) => "missing-data",
            Self::Parse(_) | Self::Json(_) => "parse",
            Self::Config(_) | Self::Io(_) => "config",
            Self::Forbidden(_) => "forbidden",
        }
    }
}

/// Result type alias for rota-core
pub type Result<T> = std::result::Result<T, RotaError>;
