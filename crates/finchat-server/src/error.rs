//! Error responses of the HTTP surface

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use finchat_market::StockError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Every way a request can fail
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body or parameters could not be used
    #[error("{0}")]
    BadRequest(String),

    /// The gateway had nothing for the request
    #[error("{0}")]
    NoData(String),

    /// The market data provider failed
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoData(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::DataUnavailable { .. } => Self::NoData(err.to_string()),
            StockError::InvalidSymbol(_) | StockError::InvalidParameter { .. } => {
                Self::BadRequest(err.to_string())
            }
            StockError::ChartError(_) | StockError::ConfigError(_) => {
                Self::Internal(err.to_string())
            }
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<finchat_core::Error> for ApiError {
    fn from(err: finchat_core::Error) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        // Market lookups keep the dataFound tag so clients can branch on it
        let body = match self {
            Self::NoData(message) => json!({ "dataFound": false, "message": message }),
            Self::Upstream(error) => json!({ "dataFound": false, "error": error }),
            Self::BadRequest(error) | Self::Internal(error) => json!({ "error": error }),
        };
        (status, Json(body)).into_response()
    }
}
