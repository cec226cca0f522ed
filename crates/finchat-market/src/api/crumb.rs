//! Cookie and crumb handshake for the quoteSummary endpoint
//!
//! Yahoo answers quoteSummary with 401 unless the request carries a session
//! cookie and the crumb minted for it. Credentials are cached until Yahoo
//! rejects them.

use crate::config::MarketConfig;
use crate::error::{Result, StockError};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Session cookie plus the crumb Yahoo issued for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub cookie: String,
    pub crumb: String,
}

/// Lazily fetched, shared quoteSummary credentials
pub(crate) struct CrumbJar {
    http: reqwest::Client,
    cookie_url: String,
    crumb_url: String,
    cached: Mutex<Option<Credentials>>,
}

impl CrumbJar {
    pub fn new(http: reqwest::Client, config: &MarketConfig) -> Self {
        Self {
            http,
            cookie_url: config.cookie_url.clone(),
            crumb_url: config.crumb_url.clone(),
            cached: Mutex::new(None),
        }
    }

    /// Cached credentials, running the handshake on first use
    pub async fn credentials(&self) -> Result<Credentials> {
        let mut cached = self.cached.lock().await;
        if let Some(credentials) = cached.as_ref() {
            return Ok(credentials.clone());
        }

        let fresh = self.handshake().await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drop cached credentials so the next call renegotiates
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn handshake(&self) -> Result<Credentials> {
        debug!(url = %self.cookie_url, "Requesting Yahoo session cookie");
        // fc.yahoo.com answers 404 but still sets the cookie
        let response = self.http.get(&self.cookie_url).send().await?;
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(cookie_pair)
            .collect::<Vec<_>>()
            .join("; ");
        if cookie.is_empty() {
            return Err(StockError::YahooFinanceError(
                "Yahoo did not issue a session cookie".to_string(),
            ));
        }

        debug!(url = %self.crumb_url, "Requesting Yahoo crumb");
        let response = self
            .http
            .get(&self.crumb_url)
            .header(COOKIE, &cookie)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let crumb = parse_crumb(status, &body)?;

        Ok(Credentials { cookie, crumb })
    }
}

/// The `name=value` part of a `Set-Cookie` header
fn cookie_pair(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    match pair.split_once('=') {
        Some((name, _)) if !name.trim().is_empty() => Some(pair.to_string()),
        _ => None,
    }
}

/// Validate the getcrumb response body
fn parse_crumb(status: StatusCode, body: &str) -> Result<String> {
    let crumb = body.trim();

    if status == StatusCode::TOO_MANY_REQUESTS || crumb.contains("Too Many Requests") {
        warn!("Yahoo rate limited the crumb request");
        return Err(StockError::YahooFinanceError(
            "rate limited while fetching crumb".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(StockError::YahooFinanceError(format!(
            "crumb request failed with HTTP {status}"
        )));
    }
    if crumb.is_empty()
        || crumb.contains("Invalid Cookie")
        || crumb.starts_with('{')
        || crumb.starts_with('<')
        || crumb.chars().any(char::is_whitespace)
    {
        return Err(StockError::YahooFinanceError(format!(
            "invalid crumb: {}",
            crumb.chars().take(80).collect::<String>()
        )));
    }

    Ok(crumb.to_string())
}

/// Whether a quoteSummary response rejected the crumb
pub(crate) fn crumb_rejected(status: StatusCode, body: &str) -> bool {
    status == StatusCode::UNAUTHORIZED
        || body.contains("Invalid Crumb")
        || body.contains("Invalid Cookie")
}
