//! Tool for the latest closing price

use async_trait::async_trait;
use finchat_core::Result as CoreResult;
use finchat_tools::Tool;
use serde_json::Value;
use std::sync::Arc;

use super::{ToolCallResult, respond, symbol_param, symbol_schema};
use crate::api::MarketDataGateway;
use crate::error::{Result, StockError};

/// `getCurrentPrice`: close of the most recent daily bar
pub struct CurrentPriceTool {
    gateway: Arc<dyn MarketDataGateway>,
}

impl CurrentPriceTool {
    /// Create a new current price tool
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self, params: &Value) -> Result<ToolCallResult> {
        let symbol = symbol_param(params)?;
        let quotes = self.gateway.history_range(&symbol, "1d").await?;

        let last = quotes
            .last()
            .ok_or_else(|| StockError::unavailable(&symbol, "no recent trading data"))?;
        Ok(ToolCallResult::found("currentPrice", last.close))
    }
}

#[async_trait]
impl Tool for CurrentPriceTool {
    async fn execute(&self, params: Value) -> CoreResult<Value> {
        Ok(respond(self.lookup(&params).await))
    }

    fn name(&self) -> &str {
        "getCurrentPrice"
    }

    fn description(&self) -> &str {
        "Returns the current price (most recent daily close) of the specified stock."
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gateway::fake::FakeGateway;
    use serde_json::json;

    #[tokio::test]
    async fn test_current_price_is_last_close() {
        let gateway = FakeGateway::with_closes(&[187.0, 189.5, 190.25]);
        let tool = CurrentPriceTool::new(Arc::new(gateway));
        let value = tool.execute(json!({"stockSymbol": "aapl"})).await.unwrap();
        assert_eq!(value, json!({"dataFound": true, "currentPrice": 190.25}));
    }

    #[tokio::test]
    async fn test_no_bars_is_missing() {
        let tool = CurrentPriceTool::new(Arc::new(FakeGateway::default()));
        let value = tool.execute(json!({"stockSymbol": "AAPL"})).await.unwrap();
        assert_eq!(value["dataFound"], false);
        assert!(value["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_missing_symbol_is_error() {
        let tool = CurrentPriceTool::new(Arc::new(FakeGateway::default()));
        let value = tool.execute(json!({})).await.unwrap();
        assert_eq!(value["dataFound"], false);
        assert!(value["error"].as_str().unwrap().contains("stockSymbol"));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_current_price() {
        let gateway = crate::api::YahooGateway::new(crate::MarketConfig::default()).unwrap();
        let tool = CurrentPriceTool::new(Arc::new(gateway));
        let value = tool.execute(json!({"stockSymbol": "AAPL"})).await.unwrap();
        assert_eq!(value["dataFound"], true);
        assert!(value["currentPrice"].as_f64().unwrap() > 0.0);
    }
}
