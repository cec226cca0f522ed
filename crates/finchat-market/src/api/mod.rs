//! Market data gateway and its Yahoo Finance implementation

mod crumb;
pub mod gateway;
pub mod yahoo;

pub use gateway::{
    Financials, MarketDataGateway, NewsArticle, Quote, Recommendation, StatementTable,
    SymbolMatch,
};
pub use yahoo::YahooGateway;
