//! Market data ingestion for the Global Market Mood pipeline
//!
//! This crate is the boundary to the external market-data provider. It
//! defines the provider capability trait, a live Yahoo-chart HTTP client, a
//! deterministic synthetic generator for environments without provider
//! access, and the symbol normalization between internal market ids and
//! provider tickers.

pub mod provider;
pub mod symbols;
pub mod synthetic;
pub mod yahoo;

pub use provider::{FetchedSeries, IngestService, IngestServiceConfig, MarketDataProvider};
pub use symbols::provider_symbol;
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
