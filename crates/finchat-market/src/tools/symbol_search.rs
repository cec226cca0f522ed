//! Tool for resolving a company name to ticker symbols

use async_trait::async_trait;
use finchat_core::Result as CoreResult;
use finchat_llm::tools::schema;
use finchat_tools::Tool;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolCallResult, respond, string_param};
use crate::api::MarketDataGateway;
use crate::error::Result;

/// `findStockSymbol`: symbols whose company name matches
pub struct FindSymbolTool {
    gateway: Arc<dyn MarketDataGateway>,
}

impl FindSymbolTool {
    /// Create a new symbol search tool
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self, params: &Value) -> Result<ToolCallResult> {
        let company = string_param(params, "companyName")?;
        let matches = self.gateway.search_symbols(&company).await?;
        if matches.is_empty() {
            return Ok(ToolCallResult::missing("No matching stock symbol found."));
        }

        let matches: Vec<Value> = matches
            .into_iter()
            .map(|m| json!({ "symbol": m.symbol, "name": m.name }))
            .collect();
        Ok(ToolCallResult::found("matches", matches))
    }
}

#[async_trait]
impl Tool for FindSymbolTool {
    async fn execute(&self, params: Value) -> CoreResult<Value> {
        Ok(respond(self.lookup(&params).await))
    }

    fn name(&self) -> &str {
        "findStockSymbol"
    }

    fn description(&self) -> &str {
        "Finds stock ticker symbols for a company name. Use it when the company is not in \
         the known company list."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "companyName": schema::string("Name of the company, e.g. Apple"),
            }),
            vec!["companyName"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gateway::fake::FakeGateway;

    #[tokio::test]
    async fn test_finds_symbol() {
        let tool = FindSymbolTool::new(Arc::new(FakeGateway::default()));
        let value = tool.execute(json!({"companyName": "apple"})).await.unwrap();
        assert_eq!(
            value,
            json!({"dataFound": true, "matches": [{"symbol": "AAPL", "name": "Apple Inc."}]})
        );
    }

    #[tokio::test]
    async fn test_no_match_is_missing() {
        let tool = FindSymbolTool::new(Arc::new(FakeGateway::default()));
        let value = tool.execute(json!({"companyName": "Acme Rockets"})).await.unwrap();
        assert_eq!(
            value,
            json!({"dataFound": false, "message": "No matching stock symbol found."})
        );
    }
}
