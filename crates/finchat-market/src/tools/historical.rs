//! Tool for daily price history over a date range

use async_trait::async_trait;
use finchat_core::Result as CoreResult;
use finchat_llm::tools::schema;
use finchat_tools::Tool;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ToolCallResult, date_param, respond, symbol_param};
use crate::api::{MarketDataGateway, Quote};
use crate::error::{Result, StockError};

const NO_DATA: &str = "No historical data found.";

/// `getHistoricalPrices`: daily bars between two dates
pub struct HistoricalPricesTool {
    gateway: Arc<dyn MarketDataGateway>,
}

impl HistoricalPricesTool {
    /// Create a new historical prices tool
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self, params: &Value) -> Result<ToolCallResult> {
        let symbol = symbol_param(params)?;
        let start = date_param(params, "startDate")?;
        let end = date_param(params, "endDate")?;
        if end < start {
            return Err(StockError::InvalidParameter {
                name: "endDate".to_string(),
                reason: format!("must not be before startDate ({start})"),
            });
        }
        // endDate is exclusive, so an equal pair selects no days
        if end == start {
            return Ok(ToolCallResult::missing(NO_DATA));
        }

        let quotes = match self.gateway.history(&symbol, start, end).await {
            Ok(quotes) => quotes,
            Err(err) if err.is_no_data() => Vec::new(),
            Err(err) => return Err(err),
        };
        if quotes.is_empty() {
            return Ok(ToolCallResult::missing(NO_DATA));
        }

        let records: Vec<Value> = quotes.iter().map(record).collect();
        Ok(ToolCallResult::found("data", records))
    }
}

/// One daily record with the column names the model expects
fn record(quote: &Quote) -> Value {
    json!({
        "Date": quote.date.format("%Y-%m-%d").to_string(),
        "Open": quote.open,
        "High": quote.high,
        "Low": quote.low,
        "Close": quote.close,
        "Adj Close": quote.adj_close,
        "Volume": quote.volume,
    })
}

#[async_trait]
impl Tool for HistoricalPricesTool {
    async fn execute(&self, params: Value) -> CoreResult<Value> {
        Ok(respond(self.lookup(&params).await))
    }

    fn name(&self) -> &str {
        "getHistoricalPrices"
    }

    fn description(&self) -> &str {
        "Returns daily historical prices of the specified stock between startDate \
         (inclusive) and endDate (exclusive), both in YYYY-MM-DD format."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "stockSymbol": schema::string("Stock ticker symbol of the company, e.g. AAPL"),
                "startDate": schema::date("Start date in YYYY-MM-DD format"),
                "endDate": schema::date("End date in YYYY-MM-DD format"),
            }),
            vec!["stockSymbol", "startDate", "endDate"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gateway::fake::FakeGateway;

    fn tool() -> HistoricalPricesTool {
        // 2024-01-01 .. 2024-01-05
        HistoricalPricesTool::new(Arc::new(FakeGateway::with_closes(&[
            185.0, 184.2, 181.9, 181.2, 182.7,
        ])))
    }

    #[tokio::test]
    async fn test_three_trading_days() {
        let tool = HistoricalPricesTool::new(Arc::new(FakeGateway::with_closes(&[
            185.6, 184.3, 181.9,
        ])));
        let value = tool
            .execute(json!({"stockSymbol": "AAPL", "startDate": "2024-01-01", "endDate": "2024-01-05"}))
            .await
            .unwrap();

        assert_eq!(value["dataFound"], true);
        let data = value["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert!(data.iter().all(|r| r["Close"].is_f64()));
        assert_eq!(data[0]["Date"], "2024-01-01");
        assert!(data[0].get("Adj Close").is_some());
    }

    #[tokio::test]
    async fn test_end_is_exclusive() {
        let value = tool()
            .execute(json!({"stockSymbol": "AAPL", "startDate": "2024-01-02", "endDate": "2024-01-04"}))
            .await
            .unwrap();
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_range_is_missing() {
        let value = tool()
            .execute(json!({"stockSymbol": "AAPL", "startDate": "2023-01-01", "endDate": "2023-02-01"}))
            .await
            .unwrap();
        assert_eq!(
            value,
            json!({"dataFound": false, "message": "No historical data found."})
        );
    }

    #[tokio::test]
    async fn test_bad_date_is_error() {
        let value = tool()
            .execute(json!({"stockSymbol": "AAPL", "startDate": "January 1st", "endDate": "2024-01-05"}))
            .await
            .unwrap();
        assert_eq!(value["dataFound"], false);
        assert!(value["error"].as_str().unwrap().contains("startDate"));
    }

    #[tokio::test]
    async fn test_reversed_range_is_error() {
        let value = tool()
            .execute(json!({"stockSymbol": "AAPL", "startDate": "2024-01-05", "endDate": "2024-01-01"}))
            .await
            .unwrap();
        assert!(value["error"].as_str().unwrap().contains("endDate"));
    }

    #[tokio::test]
    async fn test_same_start_and_end_is_missing() {
        let value = tool()
            .execute(json!({"stockSymbol": "AAPL", "startDate": "2024-01-02", "endDate": "2024-01-02"}))
            .await
            .unwrap();
        assert_eq!(
            value,
            json!({"dataFound": false, "message": "No historical data found."})
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error() {
        let tool = HistoricalPricesTool::new(Arc::new(FakeGateway::broken()));
        let value = tool
            .execute(json!({"stockSymbol": "AAPL", "startDate": "2024-01-01", "endDate": "2024-01-05"}))
            .await
            .unwrap();
        assert_eq!(value["dataFound"], false);
        assert!(value.get("error").is_some());
        assert!(value.get("message").is_none());
    }
}
