// ---------------------------------------------------------------------------
// Market-data records as the rest of the crate sees them
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest price for one ticker plus its move versus the prior close.
///
/// A snapshot: replaced wholesale on every refresh, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub ticker: String,
    pub price: f64,
    /// Absolute change versus prior close.
    pub change_amount: f64,
    /// Percent change versus prior close.
    pub change_percent: f64,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
}

/// One OHLCV bar. Provider timestamps are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Close prices of `candles`, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub published_at: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub sector: String,
    pub change_percent: f64,
}

/// Everything the refresh loop keeps per tracked ticker.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub quote: PriceQuote,
    /// Intraday bars, oldest first.
    pub candles: Vec<Candle>,
    pub news: Vec<NewsItem>,
    /// RSI of the candle closes, when there is enough history.
    pub rsi: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reference data: market movers, company profiles, search, financials
// ---------------------------------------------------------------------------

/// One entry of a gainers / losers / most-active list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMover {
    pub ticker: String,
    pub name: String,
    pub price: f64,
    pub change_amount: f64,
    pub change_percent: f64,
}

/// Top movers across the market. A list the provider could not serve is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub gainers: Vec<MarketMover>,
    pub losers: Vec<MarketMover>,
    pub actives: Vec<MarketMover>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ceo: Option<String>,
    /// "City, State" or "City, Country".
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub employees: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Option<String>,
}

/// One fiscal year of the income statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialYear {
    pub year: String,
    pub revenue: f64,
    pub net_income: f64,
}
