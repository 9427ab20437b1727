//! Error types for rota-client

use reqwest::StatusCode;
use rota_core::RotaError;
use thiserror::Error;

/// rota-client error type
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for RotaError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Configuration(msg) => RotaError::Config(msg),
            ClientError::Connection(e) => RotaError::Network(e.to_string()),
            ClientError::Parse(msg) => RotaError::Parse(msg),
            ClientError::Status { status, body } => {
                let detail = if body.is_empty() { status.to_string() } else { body };
                match status {
                    StatusCode::NOT_FOUND => RotaError::MissingData(detail),
                    StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => RotaError::Validation(detail),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RotaError::Forbidden(detail),
                    _ => RotaError::Http(format!("{}: {}", status, detail)),
                }
            }
        }
    }
}
