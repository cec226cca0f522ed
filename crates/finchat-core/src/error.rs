//! Error types for finchat-core

use thiserror::Error;

/// Result type alias for finchat-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared across tool, bridge and HTTP boundaries
#[derive(Error, Debug)]
pub enum Error {
    /// Component initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Processing a request failed
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// The caller sent a request we cannot interpret
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The model asked for a tool that is not registered
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error was caused by the caller rather than by us or an upstream
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
