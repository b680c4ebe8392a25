use std::collections::HashMap;

use parking_lot::RwLock;

use super::{MarketSnapshot, PriceQuote};

/// Thread-safe store of the latest snapshot per ticker, written by the refresh
/// loop and read by the API.
#[derive(Debug, Default)]
pub struct QuoteBoard {
    snapshots: RwLock<HashMap<String, MarketSnapshot>>,
}

impl QuoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for its ticker.
    pub fn update(&self, snapshot: MarketSnapshot) {
        self.snapshots
            .write()
            .insert(snapshot.quote.ticker.clone(), snapshot);
    }

    pub fn get(&self, ticker: &str) -> Option<MarketSnapshot> {
        self.snapshots.read().get(ticker).cloned()
    }

    /// Quote map keyed by ticker, as consumed by portfolio aggregation.
    pub fn quotes(&self) -> HashMap<String, PriceQuote> {
        self.snapshots
            .read()
            .iter()
            .map(|(ticker, s)| (ticker.clone(), s.quote.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}
