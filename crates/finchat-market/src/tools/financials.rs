//! Tool for annual financial statements

use async_trait::async_trait;
use finchat_core::Result as CoreResult;
use finchat_tools::Tool;
use serde_json::Value;
use std::sync::Arc;

use super::{ToolCallResult, respond, symbol_param, symbol_schema};
use crate::api::MarketDataGateway;
use crate::error::Result;

/// `getCompanyFinancials`: income statement, balance sheet and cash flow
pub struct FinancialsTool {
    gateway: Arc<dyn MarketDataGateway>,
}

impl FinancialsTool {
    /// Create a new financials tool
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self, params: &Value) -> Result<ToolCallResult> {
        let symbol = symbol_param(params)?;
        let financials = self.gateway.financials(&symbol).await?;
        if financials.is_empty() {
            return Ok(ToolCallResult::missing(format!(
                "No financial statements found for {symbol}."
            )));
        }
        Ok(ToolCallResult::found("financials", serde_json::to_value(financials)?))
    }
}

#[async_trait]
impl Tool for FinancialsTool {
    async fn execute(&self, params: Value) -> CoreResult<Value> {
        Ok(respond(self.lookup(&params).await))
    }

    fn name(&self) -> &str {
        "getCompanyFinancials"
    }

    fn description(&self) -> &str {
        "Returns the annual income statement, balance sheet and cash flow of the specified \
         company, each as a mapping of field to fiscal period to value."
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}
