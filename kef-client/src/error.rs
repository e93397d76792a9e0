//! Error types for the KEF client

use thiserror::Error;

/// Errors that can occur while talking to a speaker
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// Speaker answered with a non-success HTTP status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("Response parsing error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ClientError::Status(status.as_u16())
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
