//! System instruction for the finance chat model

use crate::error::{Result, StockError};
use minijinja::{Environment, context};
use serde::Serialize;

/// A company the model can resolve without a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnownCompany {
    pub name: &'static str,
    pub symbol: &'static str,
}

const fn company(name: &'static str, symbol: &'static str) -> KnownCompany {
    KnownCompany { name, symbol }
}

/// Company names mapped to ticker symbols, embedded in the system instruction
pub const KNOWN_COMPANIES: &[KnownCompany] = &[
    company("Apple Inc", "AAPL"),
    company("Microsoft Corporation", "MSFT"),
    company("Alphabet Inc (Google)", "GOOGL"),
    company("Amazon.com Inc", "AMZN"),
    company("Meta Platforms Inc (Facebook)", "META"),
    company("NVIDIA Corporation", "NVDA"),
    company("Tesla, Inc", "TSLA"),
    company("Berkshire Hathaway Inc", "BRK.B"),
    company("Adobe Inc", "ADBE"),
    company("Salesforce, Inc", "CRM"),
    company("IBM Corporation", "IBM"),
    company("Intel Corporation", "INTC"),
    company("PayPal Holdings, Inc", "PYPL"),
    company("Netflix, Inc", "NFLX"),
    company("Cisco Systems, Inc", "CSCO"),
    company("Qualcomm Incorporated", "QCOM"),
    company("AMD (Advanced Micro Devices)", "AMD"),
    company("ServiceNow, Inc", "NOW"),
    company("Square, Inc (Block, Inc)", "SQ"),
    company("Zoom Video Communications, Inc", "ZM"),
    company("Palantir Technologies Inc", "PLTR"),
    company("Shopify Inc", "SHOP"),
    company("Snowflake Inc", "SNOW"),
    company("Datadog, Inc", "DDOG"),
    company("Dropbox, Inc", "DBX"),
    company("Pinterest, Inc", "PINS"),
    company("Electronic Arts Inc", "EA"),
    company("Intuit Inc", "INTU"),
    company("Slack Technologies, Inc", "WORK"),
    company("Spotify Technology S.A.", "SPOT"),
    company("Roku, Inc", "ROKU"),
    company("Twilio Inc", "TWLO"),
    company("Lyft, Inc", "LYFT"),
    company("Snap Inc", "SNAP"),
    company("Nokia Corporation", "NOK"),
    company("Zillow Group, Inc", "Z"),
    company("Uber Technologies, Inc", "UBER"),
    company("Atlassian Corporation Plc", "TEAM"),
    company("Nutanix, Inc", "NTNX"),
    company("RingCentral, Inc", "RNG"),
    company("CrowdStrike Holdings, Inc", "CRWD"),
    company("Okta, Inc", "OKTA"),
    company("Coinbase Global, Inc", "COIN"),
    company("MercadoLibre, Inc", "MELI"),
    company("5N Plus Inc", "VNP.TO"),
    company("Kaltura, Inc", "KLTR"),
    company("Chegg, Inc", "CHGG"),
];

const SYSTEM_TEMPLATE: &str = r"You are a finance chatbot. Answer the user's queries only if they relate to finance; politely decline anything else.
When the user mentions a company, use the company's stock symbol with the available functions to look up data instead of guessing.
Match company names against this list:
{% for c in companies %}- {{ c.name }}: {{ c.symbol }}
{% endfor %}
{%- if tools %}
Available functions: {{ tools | join(', ') }}.
{%- if 'findStockSymbol' in tools %}
If a company is not in the list, call findStockSymbol to resolve its symbol first.
{%- endif %}
{%- endif %}
Dates passed to functions use the YYYY-MM-DD format. When a function reports dataFound false, tell the user the data is unavailable rather than inventing numbers.";

/// Render the system instruction, listing the callable tools
pub fn system_instruction(tool_names: &[String]) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .map_err(|e| StockError::ConfigError(format!("system prompt template: {e}")))?;

    env.get_template("system")
        .and_then(|t| t.render(context! { companies => KNOWN_COMPANIES, tools => tool_names }))
        .map_err(|e| StockError::ConfigError(format!("system prompt render: {e}")))
}

/// Case-insensitive lookup in [`KNOWN_COMPANIES`]
///
/// Matches when the query is a substring of a company name or equals a
/// symbol.
pub fn lookup_known_symbol(name: &str) -> Option<&'static str> {
    let query = name.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    KNOWN_COMPANIES
        .iter()
        .find(|c| c.symbol.eq_ignore_ascii_case(&query))
        .or_else(|| {
            KNOWN_COMPANIES
                .iter()
                .find(|c| c.name.to_lowercase().contains(&query))
        })
        .map(|c| c.symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_companies_unique() {
        let names: HashSet<_> = KNOWN_COMPANIES.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), KNOWN_COMPANIES.len());
        assert!(KNOWN_COMPANIES.len() >= 45);
    }

    #[test]
    fn test_lookup_known_symbol() {
        assert_eq!(lookup_known_symbol("apple"), Some("AAPL"));
        assert_eq!(lookup_known_symbol("  NVIDIA "), Some("NVDA"));
        assert_eq!(lookup_known_symbol("google"), Some("GOOGL"));
        assert_eq!(lookup_known_symbol("msft"), Some("MSFT"));
        assert_eq!(lookup_known_symbol("Acme Rockets"), None);
        assert_eq!(lookup_known_symbol(""), None);
    }

    #[test]
    fn test_system_instruction_lists_companies_and_tools() {
        let tools = vec!["findStockSymbol".to_string(), "getCurrentPrice".to_string()];
        let prompt = system_instruction(&tools).unwrap();

        assert!(prompt.starts_with("You are a finance chatbot."));
        assert!(prompt.contains("- Apple Inc: AAPL"));
        assert!(prompt.contains("- Chegg, Inc: CHGG"));
        assert!(prompt.contains("Available functions: findStockSymbol, getCurrentPrice."));
        assert!(prompt.contains("call findStockSymbol"));
    }

    #[test]
    fn test_system_instruction_without_tools() {
        let prompt = system_instruction(&[]).unwrap();
        assert!(!prompt.contains("Available functions"));
        assert!(prompt.contains("- Tesla, Inc: TSLA"));
    }
}
