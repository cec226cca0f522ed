//! Flattened ticker metadata for the stock details endpoint

use crate::api::MarketDataGateway;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Ticker metadata tagged with `dataFound`
///
/// Returns `{"dataFound": true, ..info}` on success and exactly
/// `{"dataFound": false}` on any failure. A metadata field that happens to
/// be named `dataFound` is overwritten by the tag.
pub async fn read_stock_data(gateway: &dyn MarketDataGateway, symbol: &str) -> Value {
    let symbol = symbol.trim().to_uppercase();

    match gateway.ticker_info(&symbol).await {
        Ok(info) => {
            debug!(symbol = %symbol, fields = info.len(), "Ticker metadata fetched");
            let mut data = Map::with_capacity(info.len() + 1);
            data.insert("dataFound".to_string(), Value::Bool(true));
            for (key, value) in info {
                if key != "dataFound" {
                    data.insert(key, value);
                }
            }
            Value::Object(data)
        }
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "Ticker metadata lookup failed");
            serde_json::json!({ "dataFound": false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gateway::fake::FakeGateway;
    use serde_json::json;

    #[tokio::test]
    async fn test_found_is_flattened() {
        let gateway = FakeGateway::default();
        let data = read_stock_data(&gateway, "aapl").await;

        assert_eq!(data["dataFound"], true);
        assert_eq!(data["longName"], "Apple Inc.");
        assert_eq!(data["sector"], "Technology");
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_exactly_not_found() {
        let gateway = FakeGateway::default();
        let data = read_stock_data(&gateway, "INVALIDSYMBOL").await;
        assert_eq!(data, json!({"dataFound": false}));
    }

    #[tokio::test]
    async fn test_gateway_outage_is_exactly_not_found() {
        let gateway = FakeGateway::broken();
        assert_eq!(read_stock_data(&gateway, "AAPL").await, json!({"dataFound": false}));
    }
}
