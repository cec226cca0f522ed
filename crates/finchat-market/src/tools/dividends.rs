//! Tool for dividend history

use async_trait::async_trait;
use finchat_core::Result as CoreResult;
use finchat_tools::Tool;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{ToolCallResult, respond, symbol_param, symbol_schema};
use crate::api::MarketDataGateway;
use crate::error::Result;

/// `getStockDividends`: ex-date → amount
pub struct DividendsTool {
    gateway: Arc<dyn MarketDataGateway>,
}

impl DividendsTool {
    /// Create a new dividends tool
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self, params: &Value) -> Result<ToolCallResult> {
        let symbol = symbol_param(params)?;
        let dividends = self.gateway.dividends(&symbol).await?;
        if dividends.is_empty() {
            return Ok(ToolCallResult::missing(format!("No dividends found for {symbol}.")));
        }

        let payload: Map<String, Value> = dividends
            .into_iter()
            .map(|(date, amount)| (date.format("%Y-%m-%d").to_string(), Value::from(amount)))
            .collect();
        Ok(ToolCallResult::found("dividends", payload))
    }
}

#[async_trait]
impl Tool for DividendsTool {
    async fn execute(&self, params: Value) -> CoreResult<Value> {
        Ok(respond(self.lookup(&params).await))
    }

    fn name(&self) -> &str {
        "getStockDividends"
    }

    fn description(&self) -> &str {
        "Returns the dividend history of the specified stock as a mapping of ex-date to amount per share."
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}
