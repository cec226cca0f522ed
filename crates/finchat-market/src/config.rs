//! Configuration for market data operations

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const DEFAULT_SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
const DEFAULT_CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Configuration for the market data gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Request timeout for the JSON endpoints
    pub request_timeout: Duration,

    /// Base URL of the quoteSummary endpoint (symbol is appended)
    pub quote_summary_url: String,

    /// URL of the search endpoint (news and symbol lookup)
    pub search_url: String,

    /// Page that hands out the session cookie quoteSummary requires
    pub cookie_url: String,

    /// Endpoint that exchanges the session cookie for a crumb
    pub crumb_url: String,

    /// Maximum number of news articles returned per symbol
    pub news_count: usize,

    /// Maximum number of symbol matches returned per search
    pub search_count: usize,

    /// User agent sent to Yahoo (the endpoints reject empty agents)
    pub user_agent: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            quote_summary_url: DEFAULT_QUOTE_SUMMARY_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            crumb_url: DEFAULT_CRUMB_URL.to_string(),
            news_count: 10,
            search_count: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Read overrides from the environment
    ///
    /// `MARKET_TIMEOUT_SECS` and `MARKET_NEWS_COUNT` are honoured; anything
    /// unset or unparsable keeps its default.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(secs) = env_parse::<u64>("MARKET_TIMEOUT_SECS") {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(count) = env_parse::<usize>("MARKET_NEWS_COUNT") {
            builder = builder.news_count(count);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.news_count == 0 || self.search_count == 0 {
            return Err(StockError::ConfigError(
                "news_count and search_count must be greater than 0".to_string(),
            ));
        }

        for url in [
            &self.quote_summary_url,
            &self.search_url,
            &self.cookie_url,
            &self.crumb_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(StockError::ConfigError(format!("not an http(s) URL: {url}")));
            }
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    request_timeout: Option<Duration>,
    quote_summary_url: Option<String>,
    search_url: Option<String>,
    cookie_url: Option<String>,
    crumb_url: Option<String>,
    news_count: Option<usize>,
    search_count: Option<usize>,
    user_agent: Option<String>,
}

impl MarketConfigBuilder {
    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the quoteSummary base URL
    pub fn quote_summary_url(mut self, url: impl Into<String>) -> Self {
        self.quote_summary_url = Some(url.into());
        self
    }

    /// Set the search URL
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = Some(url.into());
        self
    }

    /// Set the cookie and crumb handshake URLs
    pub fn crumb_urls(
        mut self,
        cookie_url: impl Into<String>,
        crumb_url: impl Into<String>,
    ) -> Self {
        self.cookie_url = Some(cookie_url.into());
        self.crumb_url = Some(crumb_url.into());
        self
    }

    /// Set the news article limit
    pub fn news_count(mut self, count: usize) -> Self {
        self.news_count = Some(count);
        self
    }

    /// Set the symbol match limit
    pub fn search_count(mut self, count: usize) -> Self {
        self.search_count = Some(count);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            quote_summary_url: self
                .quote_summary_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.quote_summary_url),
            search_url: self.search_url.unwrap_or(defaults.search_url),
            cookie_url: self.cookie_url.unwrap_or(defaults.cookie_url),
            crumb_url: self.crumb_url.unwrap_or(defaults.crumb_url),
            news_count: self.news_count.unwrap_or(defaults.news_count),
            search_count: self.search_count.unwrap_or(defaults.search_count),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }
}
