pub mod client;
pub mod quote_board;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use client::{
    parse_candles, parse_financials, parse_movers, parse_news, parse_profile, parse_quote,
    parse_search, parse_sector_performance, MarketDataClient, DEFAULT_BASE_URL,
};
pub use quote_board::QuoteBoard;
pub use types::{
    closes, Candle, CompanyProfile, FinancialYear, MarketMover, MarketOverview, MarketSnapshot,
    NewsItem, PriceQuote, SearchResult, SectorPerformance,
};

/// Anything that can produce a fresh snapshot for a ticker.
///
/// The refresh loop depends on this rather than on the HTTP client, so it can
/// be driven by a fake in tests.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot>;

    /// Market-wide sector moves; sources without them report none.
    async fn sector_performance(&self) -> Result<Vec<SectorPerformance>> {
        Ok(Vec::new())
    }
}

/// On-demand company and market reference data served straight through to
/// API callers rather than tracked by the refresh loop.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn market_overview(&self) -> MarketOverview;

    async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile>;

    /// Annual results, oldest first.
    async fn financials(&self, ticker: &str) -> Result<Vec<FinancialYear>>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}
