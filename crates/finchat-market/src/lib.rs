//! Market data for finchat
//!
//! This crate provides everything the chat service knows about stocks:
//!
//! - [`MarketDataGateway`]: the provider abstraction, with a Yahoo Finance
//!   implementation ([`YahooGateway`])
//! - The tool functions the model may call (`getCurrentPrice`,
//!   `getHistoricalPrices`, `getStockDividends`, `getStockNews`,
//!   `getCompanyFinancials`, `getStockRecommendations`, `findStockSymbol`),
//!   each answering with a [`ToolCallResult`]
//! - [`read_stock_data`] for the stock details endpoint
//! - One-month close charts rendered to PNG ([`chart`])
//! - The model's system instruction ([`prompts`])
//!
//! # Example
//!
//! ```rust,no_run
//! use finchat_market::{register_market_tools, MarketConfig, YahooGateway};
//! use finchat_tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! # fn main() -> finchat_market::Result<()> {
//! let gateway = Arc::new(YahooGateway::new(MarketConfig::default())?);
//! let registry = ToolRegistry::new();
//! register_market_tools(&registry, gateway);
//! assert_eq!(registry.len(), 7);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod details;
pub mod error;
pub mod prompts;
pub mod tools;

// Re-export commonly used types
pub use api::{MarketDataGateway, YahooGateway};
pub use chart::{ChartLabels, ChartStyle, RenderedChart};
pub use config::MarketConfig;
pub use details::read_stock_data;
pub use error::{Result, StockError};
pub use tools::{ToolCallResult, register_market_tools};
