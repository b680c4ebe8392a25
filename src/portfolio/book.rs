// =============================================================================
// Portfolio Book — every portfolio, the active selection and the watchlist
// =============================================================================
//
// Invariants:
//   - exactly one portfolio carries `is_default`, and it can never be deleted;
//   - `active_id` always names an existing portfolio;
//   - watchlist tickers are canonical and unique.
// =============================================================================

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{canonical_ticker, Portfolio, PortfolioError};

/// Id of the portfolio every book starts with.
pub const DEFAULT_PORTFOLIO_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: String,
    pub ticker: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub added_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioBook {
    portfolios: Vec<Portfolio>,
    active_id: String,
    watchlist: Vec<WatchlistItem>,
}

impl Default for PortfolioBook {
    fn default() -> Self {
        Self::new()
    }
}

impl PortfolioBook {
    pub fn new() -> Self {
        let mut default = Portfolio::new(DEFAULT_PORTFOLIO_ID, "My Portfolio", Some("Main portfolio".into()));
        default.is_default = true;

        Self {
            portfolios: vec![default],
            active_id: DEFAULT_PORTFOLIO_ID.to_string(),
            watchlist: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Portfolios
    // -------------------------------------------------------------------------

    /// Create an empty portfolio and return its id.
    pub fn create_portfolio(&mut self, name: &str, description: Option<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.portfolios.push(Portfolio::new(id.clone(), name.trim(), description));
        info!(portfolio_id = %id, name, "portfolio created");
        id
    }

    /// Delete a portfolio together with its holdings. Deleting the active
    /// portfolio re-activates the default one.
    pub fn delete_portfolio(&mut self, id: &str) -> Result<Portfolio, PortfolioError> {
        let pos = self
            .portfolios
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PortfolioError::PortfolioNotFound(id.to_string()))?;

        if self.portfolios[pos].is_default {
            return Err(PortfolioError::DefaultPortfolio);
        }

        let removed = self.portfolios.remove(pos);
        if self.active_id == removed.id {
            self.active_id = self.default_id().to_string();
        }
        info!(portfolio_id = %removed.id, holdings = removed.holdings.len(), "portfolio deleted");
        Ok(removed)
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), PortfolioError> {
        if !self.portfolios.iter().any(|p| p.id == id) {
            return Err(PortfolioError::PortfolioNotFound(id.to_string()));
        }
        self.active_id = id.to_string();
        debug!(portfolio_id = id, "active portfolio changed");
        Ok(())
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> &Portfolio {
        // The invariant guarantees a match; fall back to the default entry.
        self.get(&self.active_id).unwrap_or(&self.portfolios[0])
    }

    pub fn get(&self, id: &str) -> Option<&Portfolio> {
        self.portfolios.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Portfolio, PortfolioError> {
        self.portfolios
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PortfolioError::PortfolioNotFound(id.to_string()))
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    fn default_id(&self) -> &str {
        self.portfolios
            .iter()
            .find(|p| p.is_default)
            .map_or(DEFAULT_PORTFOLIO_ID, |p| p.id.as_str())
    }

    // -------------------------------------------------------------------------
    // Watchlist
    // -------------------------------------------------------------------------

    /// Add `ticker` to the watchlist. Returns `false` if it was already there.
    pub fn add_to_watchlist(&mut self, ticker: &str, notes: Option<String>) -> Result<bool, PortfolioError> {
        let ticker = canonical_ticker(ticker)?;
        if self.watchlist.iter().any(|w| w.ticker == ticker) {
            return Ok(false);
        }
        self.watchlist.push(WatchlistItem {
            id: Uuid::new_v4().to_string(),
            ticker,
            notes,
            added_at: Utc::now().timestamp_millis(),
        });
        Ok(true)
    }

    pub fn remove_from_watchlist(&mut self, ticker: &str) -> Option<WatchlistItem> {
        let ticker = canonical_ticker(ticker).ok()?;
        let pos = self.watchlist.iter().position(|w| w.ticker == ticker)?;
        Some(self.watchlist.remove(pos))
    }

    pub fn watchlist(&self) -> &[WatchlistItem] {
        &self.watchlist
    }

    /// Distinct tickers the refresh loop must keep current: the active
    /// portfolio's holdings plus the watchlist.
    pub fn tracked_tickers(&self) -> BTreeSet<String> {
        self.active()
            .tickers()
            .map(str::to_string)
            .chain(self.watchlist.iter().map(|w| w.ticker.clone()))
            .collect()
    }
}
