//! Tool for recent news

use async_trait::async_trait;
use finchat_core::Result as CoreResult;
use finchat_tools::Tool;
use serde_json::Value;
use std::sync::Arc;

use super::{ToolCallResult, respond, symbol_param, symbol_schema};
use crate::api::MarketDataGateway;
use crate::error::Result;

/// `getStockNews`: recent articles mentioning the symbol
pub struct NewsTool {
    gateway: Arc<dyn MarketDataGateway>,
}

impl NewsTool {
    /// Create a new news tool
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self, params: &Value) -> Result<ToolCallResult> {
        let symbol = symbol_param(params)?;
        let news = self.gateway.news(&symbol).await?;
        if news.is_empty() {
            return Ok(ToolCallResult::missing(format!("No news found for {symbol}.")));
        }
        Ok(ToolCallResult::found("news", serde_json::to_value(news)?))
    }
}

#[async_trait]
impl Tool for NewsTool {
    async fn execute(&self, params: Value) -> CoreResult<Value> {
        Ok(respond(self.lookup(&params).await))
    }

    fn name(&self) -> &str {
        "getStockNews"
    }

    fn description(&self) -> &str {
        "Returns recent news articles (title, publisher, link, publish time) about the specified stock."
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}
