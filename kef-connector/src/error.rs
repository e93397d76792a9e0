//! Error types for kef-connector

use kef_client::ClientError;
use thiserror::Error;

/// Result type for kef-connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Errors that can occur while driving a speaker entity
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Speaker unreachable or answered with something we could not read.
    ///
    /// A poll that fails this way leaves the published snapshot untouched.
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),

    /// Entity configuration is missing or out of range; setup cannot proceed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Host entity registry rejected an update
    #[error("Entity registry error: {0}")]
    Registry(String),
}

impl ConnectorError {
    /// Shorthand for a malformed device response
    pub fn malformed(msg: impl Into<String>) -> Self {
        ConnectorError::Transport(ClientError::Parse(msg.into()))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ConnectorError::Transport(_))
    }
}

/// Source catalog lookup failures. Never fatal: callers fall back to the
/// default catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown speaker model: {0}")]
    UnknownModel(String),
}
