//! Tool for analyst recommendations

use async_trait::async_trait;
use finchat_core::Result as CoreResult;
use finchat_tools::Tool;
use serde_json::Value;
use std::sync::Arc;

use super::{ToolCallResult, respond, symbol_param, symbol_schema};
use crate::api::MarketDataGateway;
use crate::error::Result;

/// `getStockRecommendations`: analyst rating counts per period
pub struct RecommendationsTool {
    gateway: Arc<dyn MarketDataGateway>,
}

impl RecommendationsTool {
    /// Create a new recommendations tool
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self, params: &Value) -> Result<ToolCallResult> {
        let symbol = symbol_param(params)?;
        let trend = self.gateway.recommendations(&symbol).await?;
        if trend.is_empty() {
            return Ok(ToolCallResult::missing(format!(
                "No analyst recommendations found for {symbol}."
            )));
        }
        Ok(ToolCallResult::found("recommendations", serde_json::to_value(trend)?))
    }
}

#[async_trait]
impl Tool for RecommendationsTool {
    async fn execute(&self, params: Value) -> CoreResult<Value> {
        Ok(respond(self.lookup(&params).await))
    }

    fn name(&self) -> &str {
        "getStockRecommendations"
    }

    fn description(&self) -> &str {
        "Returns analyst recommendation counts (strongBuy, buy, hold, sell, strongSell) \
         for recent months of the specified stock."
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
    async fn test_recommendations_list() {
        let tool = RecommendationsTool::new(Arc::new(FakeGateway::default()));
        let value = tool.execute(json!({"stockSymbol": "AAPL"})).await.unwrap();
        assert_eq!(value["dataFound"], true);
        assert_eq!(value["recommendations"][0]["strongBuy"], 11);
        assert_eq!(value["recommendations"][0]["period"], "0m");
    }
}
