//! Error types for market data operations

use thiserror::Error;
use yahoo_finance_api::YahooError;

/// Market data specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// A tool argument was missing or malformed
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// The gateway answered but had nothing for the request
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Chart rasterisation or encoding failed
    #[error("Chart error: {0}")]
    ChartError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StockError {
    /// Shorthand for [`StockError::DataUnavailable`]
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means "nothing there" rather than "something broke"
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

impl StockError {
    /// Classify a connector error for `symbol`
    ///
    /// Empty data sets and "Not Found" API errors are lookup misses; every
    /// other connector error is an upstream failure.
    pub fn from_yahoo(symbol: &str, err: YahooError) -> Self {
        match err {
            YahooError::NoQuotes | YahooError::NoResult => {
                Self::unavailable(symbol, "no quotes for the requested period")
            }
            YahooError::ApiError(ref message)
                if message
                    .code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case("Not Found")) =>
            {
                let reason = message
                    .description
                    .clone()
                    .unwrap_or_else(|| "not found".to_string());
                Self::unavailable(symbol, reason)
            }
            other => Self::YahooFinanceError(other.to_string()),
        }
    }
}

impl From<YahooError> for StockError {
    fn from(err: YahooError) -> Self {
        Self::from_yahoo("the requested symbol", err)
    }
}

impl From<image::ImageError> for StockError {
    fn from(err: image::ImageError) -> Self {
        StockError::ChartError(err.to_string())
    }
}

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Convert StockError to finchat_core::Error
impl From<StockError> for finchat_core::Error {
    fn from(err: StockError) -> Self {
        match err {
            StockError::ConfigError(msg) => finchat_core::Error::InitializationFailed(msg),
            StockError::InvalidSymbol(_) | StockError::InvalidParameter { .. } => {
                finchat_core::Error::InvalidRequest(err.to_string())
            }
            other => finchat_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = StockError::unavailable("AAPL", "No data found");
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
        assert!(err.is_no_data());
    }

    #[test]
    fn test_error_conversion() {
        let stock_err = StockError::YahooFinanceError("timeout".to_string());
        let core_err: finchat_core::Error = stock_err.into();

        match core_err {
            finchat_core::Error::ProcessingFailed(msg) => {
                assert!(msg.contains("Yahoo Finance error"));
            }
            _ => panic!("Expected ProcessingFailed variant"),
        }

        let core_err: finchat_core::Error = StockError::InvalidParameter {
            name: "startDate".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert!(core_err.is_client_error());
    }

    #[test]
    fn test_empty_data_set_is_a_lookup_miss() {
        for err in [YahooError::NoQuotes, YahooError::NoResult] {
            let err = StockError::from_yahoo("AAPL", err);
            assert!(err.is_no_data());
            assert!(err.to_string().contains("AAPL"));
        }
        assert!(StockError::from(YahooError::NoQuotes).is_no_data());
    }

    #[test]
    fn test_not_found_api_error_is_a_lookup_miss() {
        let not_found = YahooError::ApiError(
            serde_json::from_value(serde_json::json!({
                "code": "Not Found",
                "description": "No data found, symbol may be delisted"
            }))
            .unwrap(),
        );
        let err = StockError::from_yahoo("NOPE", not_found);
        assert!(err.is_no_data());
        assert!(err.to_string().contains("symbol may be delisted"));

        let bad_request = YahooError::ApiError(
            serde_json::from_value(serde_json::json!({
                "code": "Bad Request",
                "description": "Invalid input - interval=1x is not supported"
            }))
            .unwrap(),
        );
        assert!(matches!(
            StockError::from_yahoo("AAPL", bad_request),
            StockError::YahooFinanceError(_)
        ));
    }

    #[test]
    fn test_upstream_failures_stay_errors() {
        for err in [
            YahooError::Unauthorized,
            YahooError::InvalidCrumb,
            YahooError::TooManyRequests("chart".to_string()),
            YahooError::DataInconsistency,
        ] {
            let err = StockError::from_yahoo("AAPL", err);
            assert!(!err.is_no_data(), "{err} should be an upstream failure");
        }
    }
}
