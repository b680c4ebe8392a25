use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PortfolioError;

/// Longest symbol accepted, exchange suffix included.
const MAX_TICKER_LEN: usize = 16;

/// Canonical form of a ticker: surrounding whitespace removed, upper-case.
///
/// Only ASCII letters, digits and `.`, `-`, `^`, `=` are allowed, so a ticker
/// is always safe to splice into a provider URL path.
pub fn canonical_ticker(raw: &str) -> Result<String, PortfolioError> {
    let ticker = raw.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(PortfolioError::EmptyTicker);
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=');
    if ticker.len() > MAX_TICKER_LEN || !ticker.chars().all(allowed) {
        return Err(PortfolioError::InvalidTicker(ticker));
    }
    Ok(ticker)
}

// ---------------------------------------------------------------------------
// Holding
// ---------------------------------------------------------------------------

/// A position in one ticker inside a portfolio.
///
/// Market value is never stored; it is always `price * quantity` at the time
/// a quote is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub ticker: String,
    pub quantity: f64,
    /// Average cost per unit.
    pub avg_cost: f64,
    /// Milliseconds since the UNIX epoch.
    pub added_at: i64,
}

impl Holding {
    pub fn new(ticker: &str, quantity: f64, avg_cost: f64) -> Result<Self, PortfolioError> {
        let ticker = canonical_ticker(ticker)?;
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(PortfolioError::InvalidQuantity(quantity));
        }
        if !avg_cost.is_finite() || avg_cost < 0.0 {
            return Err(PortfolioError::InvalidCost(avg_cost));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            ticker,
            quantity,
            avg_cost,
            added_at: Utc::now().timestamp_millis(),
        })
    }

    pub fn market_value(&self, price: f64) -> f64 {
        price * self.quantity
    }

    pub fn cost_basis(&self) -> f64 {
        self.avg_cost * self.quantity
    }

    /// Fold another lot of the same ticker into this one. Quantities add and
    /// the average cost becomes the quantity-weighted mean.
    fn absorb(&mut self, other: &Holding) {
        let total_qty = self.quantity + other.quantity;
        if total_qty > 0.0 {
            self.avg_cost = (self.cost_basis() + other.cost_basis()) / total_qty;
        }
        self.quantity = total_qty;
    }
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// A named collection of holdings, at most one per ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: i64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description,
            created_at: Utc::now().timestamp_millis(),
            is_default: false,
            holdings: Vec::new(),
        }
    }

    /// Add a holding. A holding for a ticker already present is merged into
    /// the existing one; returns the id of the holding that now carries it.
    pub fn add_holding(&mut self, holding: Holding) -> String {
        if let Some(existing) = self.holdings.iter_mut().find(|h| h.ticker == holding.ticker) {
            existing.absorb(&holding);
            return existing.id.clone();
        }
        let id = holding.id.clone();
        self.holdings.push(holding);
        id
    }

    /// Remove the holding for `ticker` (any case). Returns the removed holding.
    pub fn remove_holding(&mut self, ticker: &str) -> Option<Holding> {
        let ticker = canonical_ticker(ticker).ok()?;
        let pos = self.holdings.iter().position(|h| h.ticker == ticker)?;
        Some(self.holdings.remove(pos))
    }

    pub fn holding(&self, ticker: &str) -> Option<&Holding> {
        let ticker = canonical_ticker(ticker).ok()?;
        self.holdings.iter().find(|h| h.ticker == ticker)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.holdings.iter().map(|h| h.ticker.as_str())
    }
}
