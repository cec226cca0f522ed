//! Yahoo Finance gateway
//!
//! Price history, dividends and ticker metadata come through
//! `yahoo_finance_api`. Statements and recommendations come from the
//! `quoteSummary` endpoint behind a cookie and crumb handshake, news and
//! symbol lookup from `search`; both are plain JSON fetched with reqwest.

use super::crumb::{CrumbJar, crumb_rejected};
use super::gateway::{
    Financials, MarketDataGateway, NewsArticle, Quote, Recommendation, StatementTable,
    SymbolMatch,
};
use crate::config::MarketConfig;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::COOKIE;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

const STATEMENT_MODULES: &str =
    "incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory";
const RECOMMENDATION_MODULES: &str = "recommendationTrend";

/// Yahoo Finance implementation of [`MarketDataGateway`]
pub struct YahooGateway {
    connector: yahoo::YahooConnector,
    // get_ticker_info refreshes its crumb in place and needs `&mut`
    info_connector: Mutex<yahoo::YahooConnector>,
    crumbs: CrumbJar,
    http: reqwest::Client,
    config: MarketConfig,
}

impl YahooGateway {
    /// Create a gateway with the given configuration
    pub fn new(config: MarketConfig) -> Result<Self> {
        config.validate()?;

        let connector = yahoo::YahooConnector::new()?;
        let info_connector = Mutex::new(yahoo::YahooConnector::new()?);
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        let crumbs = CrumbJar::new(http.clone(), &config);

        Ok(Self {
            connector,
            info_connector,
            crumbs,
            http,
            config,
        })
    }

    /// Get the gateway configuration
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    async fn get_json(&self, symbol: &str, url: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!(url, "Fetching Yahoo JSON");
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StockError::unavailable(symbol, "symbol not found"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Yahoo request failed");
            return Err(StockError::YahooFinanceError(format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response.json().await?)
    }

    /// Fetch quoteSummary modules, renegotiating the crumb once if rejected
    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Map<String, Value>> {
        let url = format!("{}/{symbol}", self.config.quote_summary_url);
        let mut retried = false;

        loop {
            let credentials = self.crumbs.credentials().await?;
            debug!(url = %url, modules, "Fetching quoteSummary");
            let response = self
                .http
                .get(&url)
                .query(&[("modules", modules), ("crumb", credentials.crumb.as_str())])
                .header(COOKIE, &credentials.cookie)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;

            if crumb_rejected(status, &body) {
                self.crumbs.invalidate().await;
                if retried {
                    warn!(status = %status, "quoteSummary rejected a fresh crumb");
                    return Err(StockError::YahooFinanceError(format!(
                        "quoteSummary rejected credentials (HTTP {status})"
                    )));
                }
                retried = true;
                continue;
            }

            // Not Found bodies carry a quoteSummary.error that summary_result classifies
            if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
                warn!(status = %status, "quoteSummary request failed");
                return Err(StockError::YahooFinanceError(format!(
                    "HTTP {status}: {}",
                    body.chars().take(200).collect::<String>()
                )));
            }

            return summary_result(symbol, serde_json::from_str(&body)?);
        }
    }

    async fn search(&self, query: &str, quotes: usize, news: usize) -> Result<SearchResponse> {
        let body = self
            .get_json(
                query,
                &self.config.search_url,
                &[
                    ("q", query.to_string()),
                    ("quotesCount", quotes.to_string()),
                    ("newsCount", news.to_string()),
                ],
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl MarketDataGateway for YahooGateway {
    #[instrument(skip(self))]
    async fn ticker_info(&self, symbol: &str) -> Result<Map<String, Value>> {
        let summary = {
            let mut connector = self.info_connector.lock().await;
            connector
                .get_ticker_info(symbol)
                .await
                .map_err(|e| StockError::from_yahoo(symbol, e))?
        };

        let modules = summary_result(symbol, serde_json::to_value(summary)?)?;
        let info = flatten_modules(modules);
        if info.is_empty() {
            return Err(StockError::unavailable(symbol, "no ticker metadata"));
        }
        Ok(info)
    }

    #[instrument(skip(self))]
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Quote>> {
        let classify = |e: yahoo::YahooError| StockError::from_yahoo(symbol, e);
        let response = self
            .connector
            .get_quote_history(symbol, to_offset(start)?, to_offset(end)?)
            .await
            .map_err(classify)?;

        let quotes = convert_quotes(&response.quotes().map_err(classify)?);
        Ok(quotes
            .into_iter()
            .filter(|q| q.date >= start && q.date < end)
            .collect())
    }

    #[instrument(skip(self))]
    async fn history_range(&self, symbol: &str, range: &str) -> Result<Vec<Quote>> {
        let classify = |e: yahoo::YahooError| StockError::from_yahoo(symbol, e);
        let response = self
            .connector
            .get_quote_range(symbol, "1d", range)
            .await
            .map_err(classify)?;
        Ok(convert_quotes(&response.quotes().map_err(classify)?))
    }

    #[instrument(skip(self))]
    async fn dividends(&self, symbol: &str) -> Result<BTreeMap<NaiveDate, f64>> {
        let classify = |e: yahoo::YahooError| StockError::from_yahoo(symbol, e);
        let response = self
            .connector
            .get_quote_range(symbol, "1d", "max")
            .await
            .map_err(classify)?;
        let dividends = response.dividends().map_err(classify)?;

        Ok(dividends
            .iter()
            .filter_map(|d| Some((timestamp_date(d.date as i64)?, d.amount)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn news(&self, symbol: &str) -> Result<Vec<NewsArticle>> {
        let response = self.search(symbol, 0, self.config.news_count).await?;
        Ok(response.news.into_iter().map(NewsArticle::from).collect())
    }

    #[instrument(skip(self))]
    async fn financials(&self, symbol: &str) -> Result<Financials> {
        let modules = self.quote_summary(symbol, STATEMENT_MODULES).await?;
        Ok(parse_financials(&modules))
    }

    #[instrument(skip(self))]
    async fn recommendations(&self, symbol: &str) -> Result<Vec<Recommendation>> {
        let modules = self.quote_summary(symbol, RECOMMENDATION_MODULES).await?;
        parse_recommendations(&modules)
    }

    #[instrument(skip(self))]
    async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>> {
        let response = self.search(query, self.config.search_count, 0).await?;
        Ok(response
            .quotes
            .into_iter()
            .filter_map(SearchQuote::into_match)
            .collect())
    }
}

// ============================================================================
// Search endpoint types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    exchange: Option<String>,
    quote_type: Option<String>,
}

impl SearchQuote {
    fn into_match(self) -> Option<SymbolMatch> {
        let symbol = self.symbol?;
        let name = self
            .longname
            .or(self.shortname)
            .unwrap_or_else(|| symbol.clone());
        Some(SymbolMatch {
            symbol,
            name,
            exchange: self.exchange,
            quote_type: self.quote_type,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    title: String,
    publisher: Option<String>,
    link: Option<String>,
    provider_publish_time: Option<i64>,
    #[serde(default)]
    related_tickers: Vec<String>,
}

impl From<SearchNews> for NewsArticle {
    fn from(item: SearchNews) -> Self {
        Self {
            title: item.title,
            publisher: item.publisher,
            link: item.link,
            published_at: item
                .provider_publish_time
                .and_then(|t| DateTime::from_timestamp(t, 0)),
            related_tickers: item.related_tickers,
        }
    }
}

// ============================================================================
// Conversion helpers
// ============================================================================

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| StockError::YahooFinanceError(format!("Invalid date {date}: {e}")))
}

fn timestamp_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

fn convert_quotes(quotes: &[yahoo::Quote]) -> Vec<Quote> {
    quotes
        .iter()
        .filter_map(|q| {
            Some(Quote {
                date: timestamp_date(q.timestamp as i64)?,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                adj_close: q.adjclose,
                volume: q.volume,
            })
        })
        .collect()
}

/// Pull the module map out of a quoteSummary body
///
/// A "Not Found" error means the symbol has no data; any other error is an
/// upstream failure.
fn summary_result(symbol: &str, body: Value) -> Result<Map<String, Value>> {
    if let Some(error) = body.pointer("/finance/error").filter(|e| !e.is_null()) {
        return Err(StockError::YahooFinanceError(error_text(error, "finance error")));
    }

    let summary = body.get("quoteSummary").cloned().unwrap_or_default();

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let not_found = error
            .get("code")
            .and_then(Value::as_str)
            .is_some_and(|code| code.eq_ignore_ascii_case("Not Found"));
        let reason = error_text(error, "quoteSummary error");
        return Err(if not_found {
            StockError::unavailable(symbol, reason)
        } else {
            StockError::YahooFinanceError(reason)
        });
    }

    match summary.get("result").and_then(Value::as_array).and_then(|r| r.first()) {
        Some(Value::Object(modules)) => Ok(modules.clone()),
        _ => Err(StockError::unavailable(symbol, "empty quoteSummary result")),
    }
}

fn error_text(error: &Value, fallback: &str) -> String {
    let field = |key: &str| error.get(key).and_then(Value::as_str);
    match (field("code"), field("description")) {
        (Some(code), Some(description)) => format!("{code}: {description}"),
        (None, Some(description)) => description.to_string(),
        (Some(code), None) => code.to_string(),
        (None, None) => fallback.to_string(),
    }
}

/// Replace Yahoo's `{raw, fmt}` wrappers with the raw value
fn unwrap_raw(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("raw") => {
            map.remove("raw").unwrap_or_default()
        }
        Value::Object(map) if map.is_empty() => Value::Null,
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, unwrap_raw(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_raw).collect()),
        other => other,
    }
}

/// Merge every module's fields into one flat map; later modules win
fn flatten_modules(modules: Map<String, Value>) -> Map<String, Value> {
    let mut info = Map::new();
    for (_, module) in modules {
        if let Value::Object(fields) = module {
            for (key, value) in fields {
                if key == "maxAge" || value.is_null() {
                    continue;
                }
                info.insert(key, unwrap_raw(value));
            }
        }
    }
    info
}

fn statement_table(modules: &Map<String, Value>, module: &str, list_key: &str) -> StatementTable {
    let mut table = StatementTable::new();
    let Some(rows) = modules
        .get(module)
        .and_then(|m| m.get(list_key))
        .and_then(Value::as_array)
    else {
        return table;
    };

    for row in rows {
        let Some(fields) = row.as_object() else {
            continue;
        };
        let Some(period) = fields.get("endDate").and_then(period_label) else {
            continue;
        };

        for (field, value) in fields {
            if field == "endDate" || field == "maxAge" {
                continue;
            }
            let value = unwrap_raw(value.clone());
            if value.is_null() {
                continue;
            }
            table
                .entry(field.clone())
                .or_default()
                .insert(period.clone(), value);
        }
    }

    table
}

fn period_label(end_date: &Value) -> Option<String> {
    if let Some(fmt) = end_date.get("fmt").and_then(Value::as_str) {
        return Some(fmt.to_string());
    }
    end_date
        .get("raw")
        .and_then(Value::as_i64)
        .and_then(timestamp_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_financials(modules: &Map<String, Value>) -> Financials {
    Financials {
        income_statement: statement_table(
            modules,
            "incomeStatementHistory",
            "incomeStatementHistory",
        ),
        balance_sheet: statement_table(
            modules,
            "balanceSheetHistory",
            "balanceSheetStatements",
        ),
        cash_flow: statement_table(
            modules,
            "cashflowStatementHistory",
            "cashflowStatements",
        ),
    }
}

fn parse_recommendations(modules: &Map<String, Value>) -> Result<Vec<Recommendation>> {
    let trend = modules
        .get("recommendationTrend")
        .and_then(|m| m.get("trend"))
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    Ok(serde_json::from_value(trend)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_raw() {
        let value = json!({
            "marketCap": {"raw": 3_000_000_000_000_u64, "fmt": "3T"},
            "longName": "Apple Inc.",
            "empty": {},
            "officers": [{"age": {"raw": 62}}]
        });
        let unwrapped = unwrap_raw(value);
        assert_eq!(unwrapped["marketCap"], 3_000_000_000_000_u64);
        assert_eq!(unwrapped["longName"], "Apple Inc.");
        assert!(unwrapped["empty"].is_null());
        assert_eq!(unwrapped["officers"][0]["age"], 62);
    }

    #[test]
    fn test_summary_result_and_flatten() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "price": {"maxAge": 1, "symbol": "AAPL", "regularMarketPrice": {"raw": 190.1, "fmt": "190.10"}},
                    "assetProfile": {"sector": "Technology", "fullTimeEmployees": 161000}
                }],
                "error": null
            }
        });

        let modules = summary_result("AAPL", body).unwrap();
        let info = flatten_modules(modules);

        assert_eq!(info["symbol"], "AAPL");
        assert_eq!(info["regularMarketPrice"], 190.1);
        assert_eq!(info["sector"], "Technology");
        assert!(!info.contains_key("maxAge"));
    }

    #[test]
    fn test_summary_error_is_unavailable() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for ticker symbol: NOPE"}
            }
        });

        let err = summary_result("NOPE", body).unwrap_err();
        assert!(err.is_no_data());
        assert!(err.to_string().contains("Quote not found"));
    }

    #[test]
    fn test_summary_auth_errors_are_upstream_failures() {
        let body = json!({
            "finance": {
                "result": null,
                "error": {"code": "Unauthorized", "description": "Invalid Crumb"}
            }
        });
        let err = summary_result("AAPL", body).unwrap_err();
        assert!(!err.is_no_data());
        assert!(err.to_string().contains("Invalid Crumb"));

        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Internal Server Error", "description": "backend timeout"}
            }
        });
        assert!(!summary_result("AAPL", body).unwrap_err().is_no_data());
    }

    #[test]
    fn test_typed_ticker_info_flattens() {
        // get_ticker_info serialises camelCase modules with nulls for absent fields
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "assetProfile": {"sector": "Technology", "website": null},
                    "summaryDetail": {"marketCap": 3_000_000_000_000_u64, "dividendYield": null},
                    "quoteType": {"symbol": "AAPL", "longName": "Apple Inc."}
                }],
                "error": null
            },
            "finance": null
        });

        let info = flatten_modules(summary_result("AAPL", body).unwrap());
        assert_eq!(info["sector"], "Technology");
        assert_eq!(info["longName"], "Apple Inc.");
        assert_eq!(info["marketCap"], 3_000_000_000_000_u64);
        assert!(!info.contains_key("website"));
        assert!(!info.contains_key("dividendYield"));
    }

    #[test]
    fn test_parse_financials() {
        let modules = json!({
            "incomeStatementHistory": {
                "incomeStatementHistory": [
                    {"endDate": {"raw": 1_696_032_000, "fmt": "2023-09-30"}, "totalRevenue": {"raw": 383_285_000_000_u64}, "maxAge": 1},
                    {"endDate": {"raw": 1_664_496_000, "fmt": "2022-09-30"}, "totalRevenue": {"raw": 394_328_000_000_u64}}
                ]
            },
            "balanceSheetHistory": {
                "balanceSheetStatements": [
                    {"endDate": {"raw": 1_696_032_000}, "cash": {"raw": 29_965_000_000_u64}, "netDebt": {}}
                ]
            }
        });
        let Value::Object(modules) = modules else { unreachable!() };

        let financials = parse_financials(&modules);

        let revenue = &financials.income_statement["totalRevenue"];
        assert_eq!(revenue.len(), 2);
        assert_eq!(revenue["2023-09-30"], 383_285_000_000_u64);
        assert!(!financials.income_statement.contains_key("maxAge"));

        // raw-only endDate falls back to the timestamp's date
        assert!(financials.balance_sheet["cash"].contains_key("2023-09-30"));
        assert!(!financials.balance_sheet.contains_key("netDebt"));
        assert!(financials.cash_flow.is_empty());
    }

    #[test]
    fn test_parse_recommendations() {
        let modules = json!({
            "recommendationTrend": {
                "trend": [
                    {"period": "0m", "strongBuy": 11, "buy": 21, "hold": 6, "sell": 0, "strongSell": 1},
                    {"period": "-1m", "strongBuy": 10, "buy": 20, "hold": 7, "sell": 1, "strongSell": 1}
                ],
                "maxAge": 86400
            }
        });
        let Value::Object(modules) = modules else { unreachable!() };

        let trend = parse_recommendations(&modules).unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].period, "0m");
        assert_eq!(trend[0].strong_buy, 11);
        assert_eq!(trend[1].sell, 1);
    }

    #[test]
    fn test_search_response_parsing() {
        let body = json!({
            "quotes": [
                {"symbol": "AAPL", "shortname": "Apple Inc.", "longname": "Apple Inc.", "exchange": "NMS", "quoteType": "EQUITY"},
                {"shortname": "no symbol"},
                {"symbol": "APLE", "shortname": "Apple Hospitality REIT"}
            ],
            "news": [
                {"uuid": "1", "title": "Apple earnings", "publisher": "Reuters", "link": "https://example.com", "providerPublishTime": 1_700_000_000, "relatedTickers": ["AAPL"]}
            ]
        });

        let response: SearchResponse = serde_json::from_value(body).unwrap();
        let matches: Vec<SymbolMatch> = response
            .quotes
            .into_iter()
            .filter_map(SearchQuote::into_match)
            .collect();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].quote_type.as_deref(), Some("EQUITY"));
        assert_eq!(matches[1].name, "Apple Hospitality REIT");

        let article = NewsArticle::from(response.news.into_iter().next().unwrap());
        assert_eq!(article.title, "Apple earnings");
        assert!(article.published_at.is_some());
    }

    #[test]
    fn test_to_offset() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(to_offset(date).unwrap().unix_timestamp(), 1_704_067_200);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_history_range_live() {
        let gateway = YahooGateway::new(MarketConfig::default()).unwrap();
        let quotes = gateway.history_range("AAPL", "1mo").await.unwrap();
        assert!(!quotes.is_empty());
        assert!(quotes.iter().all(|q| q.close > 0.0));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_search_symbols_live() {
        let gateway = YahooGateway::new(MarketConfig::default()).unwrap();
        let matches = gateway.search_symbols("Microsoft").await.unwrap();
        assert!(matches.iter().any(|m| m.symbol == "MSFT"));
    }
}
