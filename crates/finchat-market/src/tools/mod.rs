//! Market tools the model can call
//!
//! Every tool is a thin adapter over one [`MarketDataGateway`] call and
//! always answers with a [`ToolCallResult`]; gateway failures never surface
//! as `Err` to the executor.

pub mod current_price;
pub mod dividends;
pub mod financials;
pub mod historical;
pub mod news;
pub mod recommendations;
pub mod result;
pub mod symbol_search;

pub use current_price::CurrentPriceTool;
pub use dividends::DividendsTool;
pub use financials::FinancialsTool;
pub use historical::HistoricalPricesTool;
pub use news::NewsTool;
pub use recommendations::RecommendationsTool;
pub use result::ToolCallResult;
pub use symbol_search::FindSymbolTool;

use crate::api::MarketDataGateway;
use crate::error::{Result, StockError};
use chrono::NaiveDate;
use finchat_tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Register all market tools against one gateway
pub fn register_market_tools(registry: &ToolRegistry, gateway: Arc<dyn MarketDataGateway>) {
    registry.register(Arc::new(CurrentPriceTool::new(Arc::clone(&gateway))));
    registry.register(Arc::new(HistoricalPricesTool::new(Arc::clone(&gateway))));
    registry.register(Arc::new(DividendsTool::new(Arc::clone(&gateway))));
    registry.register(Arc::new(NewsTool::new(Arc::clone(&gateway))));
    registry.register(Arc::new(FinancialsTool::new(Arc::clone(&gateway))));
    registry.register(Arc::new(RecommendationsTool::new(Arc::clone(&gateway))));
    registry.register(Arc::new(FindSymbolTool::new(gateway)));
    info!(tool_count = registry.len(), "Market tools registered");
}

/// Required string argument, trimmed
fn string_param(params: &Value, name: &str) -> Result<String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StockError::InvalidParameter {
            name: name.to_string(),
            reason: "a non-empty string is required".to_string(),
        })
}

/// The `stockSymbol` argument, trimmed and upper-cased
fn symbol_param(params: &Value) -> Result<String> {
    let symbol = string_param(params, "stockSymbol")?.to_uppercase();
    if symbol.chars().any(char::is_whitespace) {
        return Err(StockError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

/// A `YYYY-MM-DD` argument
fn date_param(params: &Value, name: &str) -> Result<NaiveDate> {
    let raw = string_param(params, name)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| StockError::InvalidParameter {
        name: name.to_string(),
        reason: format!("expected YYYY-MM-DD, got {raw:?} ({e})"),
    })
}

/// Collapse a lookup into the value returned to the model
fn respond(outcome: Result<ToolCallResult>) -> Value {
    outcome.unwrap_or_else(ToolCallResult::from).into_value()
}

/// Common `stockSymbol`-only schema
fn symbol_schema() -> Value {
    use finchat_llm::tools::schema;
    schema::object(
        serde_json::json!({
            "stockSymbol": schema::string("Stock ticker symbol of the company, e.g. AAPL"),
        }),
        vec!["stockSymbol"],
    )
}
