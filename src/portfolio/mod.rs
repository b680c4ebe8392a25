// =============================================================================
// Portfolio Module
// =============================================================================
//
// In-memory portfolios, holdings and the watchlist, plus the pure aggregation
// that turns holdings + a quote snapshot into dashboard totals.
//
// Tickers are case-insensitive identities: every entry point canonicalises
// them (trimmed, upper-case, URL-safe characters only) before storing or
// looking anything up.

pub mod aggregate;
pub mod book;
pub mod holding;

use thiserror::Error;

pub use aggregate::{
    aggregate_portfolio, aggregate_portfolio_strict, allocation, AggregateReport, AllocationSlice,
    PortfolioSummary,
};
pub use book::{PortfolioBook, WatchlistItem, DEFAULT_PORTFOLIO_ID};
pub use holding::{canonical_ticker, Holding, Portfolio};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("invalid ticker '{0}'")]
    InvalidTicker(String),

    #[error("quantity must be finite and non-negative (got {0})")]
    InvalidQuantity(f64),

    #[error("average cost must be finite and non-negative (got {0})")]
    InvalidCost(f64),

    #[error("portfolio '{0}' not found")]
    PortfolioNotFound(String),

    #[error("the default portfolio cannot be deleted")]
    DefaultPortfolio,
}
