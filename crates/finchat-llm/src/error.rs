//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The model refused to answer (prompt or candidate blocked)
    #[error("Response blocked: {0}")]
    Blocked(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Convert LLMError to finchat_core::Error
impl From<LLMError> for finchat_core::Error {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::ConfigurationError(msg) => finchat_core::Error::InitializationFailed(msg),
            other => finchat_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_maps_to_initialization() {
        let err: finchat_core::Error =
            LLMError::ConfigurationError("geminiAPI not set".to_string()).into();
        assert!(matches!(err, finchat_core::Error::InitializationFailed(_)));
    }

    #[test]
    fn test_request_error_maps_to_processing() {
        let err: finchat_core::Error = LLMError::RateLimitExceeded("quota".to_string()).into();
        match err {
            finchat_core::Error::ProcessingFailed(msg) => assert!(msg.contains("quota")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
