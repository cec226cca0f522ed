//! Market data gateway abstraction
//!
//! Everything the tools, the details endpoint and the chart need from a
//! market data provider goes through [`MarketDataGateway`]. The Yahoo
//! implementation lives in [`super::yahoo`]; tests use in-memory fakes.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One daily bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// A news article about a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related_tickers: Vec<String>,
}

/// Field → period → value
pub type StatementTable = BTreeMap<String, BTreeMap<String, Value>>;

/// Annual financial statements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub income_statement: StatementTable,
    pub balance_sheet: StatementTable,
    pub cash_flow: StatementTable,
}

impl Financials {
    /// True when none of the statements has any field
    pub fn is_empty(&self) -> bool {
        self.income_statement.is_empty()
            && self.balance_sheet.is_empty()
            && self.cash_flow.is_empty()
    }
}

/// Analyst recommendation counts for one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Relative period, e.g. `0m` for the current month, `-1m` for the last
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// A symbol returned by a name search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub quote_type: Option<String>,
}

/// Provider of market data, keyed by ticker symbol
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Flat ticker metadata (profile, price, key statistics)
    async fn ticker_info(&self, symbol: &str) -> Result<Map<String, Value>>;

    /// Daily bars from `start` (inclusive) to `end` (exclusive)
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Quote>>;

    /// Daily bars for a provider range such as `1d`, `5d` or `1mo`
    async fn history_range(&self, symbol: &str, range: &str) -> Result<Vec<Quote>>;

    /// Dividend amounts by ex-date
    async fn dividends(&self, symbol: &str) -> Result<BTreeMap<NaiveDate, f64>>;

    /// Recent news
    async fn news(&self, symbol: &str) -> Result<Vec<NewsArticle>>;

    /// Annual income statement, balance sheet and cash flow
    async fn financials(&self, symbol: &str) -> Result<Financials>;

    /// Analyst recommendation trend
    async fn recommendations(&self, symbol: &str) -> Result<Vec<Recommendation>>;

    /// Symbols whose name matches `query`
    async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>>;
}
