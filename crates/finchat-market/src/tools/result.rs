//! The uniform result shape of every market tool

use crate::error::StockError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Outcome of one tool invocation
///
/// Serialises to `{"dataFound": true, <key>: payload}`, or
/// `{"dataFound": false, "message": ..}` for an expected empty result, or
/// `{"dataFound": false, "error": ..}` when something failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallResult {
    Found { key: &'static str, payload: Value },
    Missing { message: String },
    Failed { error: String },
}

impl ToolCallResult {
    /// Successful result under `key`
    pub fn found(key: &'static str, payload: impl Into<Value>) -> Self {
        Self::Found {
            key,
            payload: payload.into(),
        }
    }

    /// Expected empty result
    pub fn missing(message: impl Into<String>) -> Self {
        Self::Missing {
            message: message.into(),
        }
    }

    /// Failed lookup
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Whether data was found
    pub fn data_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// JSON value handed back to the model
    pub fn into_value(self) -> Value {
        serde_json::to_value(&self).unwrap_or_else(|e| {
            serde_json::json!({ "dataFound": false, "error": e.to_string() })
        })
    }
}

impl From<StockError> for ToolCallResult {
    fn from(err: StockError) -> Self {
        match err {
            StockError::DataUnavailable { .. } => Self::missing(err.to_string()),
            other => Self::failed(other.to_string()),
        }
    }
}

impl Serialize for ToolCallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Self::Found { key, payload } => {
                map.serialize_entry("dataFound", &true)?;
                map.serialize_entry(key, payload)?;
            }
            Self::Missing { message } => {
                map.serialize_entry("dataFound", &false)?;
                map.serialize_entry("message", message)?;
            }
            Self::Failed { error } => {
                map.serialize_entry("dataFound", &false)?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}
