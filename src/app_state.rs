// =============================================================================
// Central Application State — Alpha Vision
// =============================================================================
//
// Ties together the portfolio book, the quote board fed by the refresh loop,
// the shared fetch cache and the runtime configuration, and builds the
// dashboard snapshot served by `GET /api/v1/state`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections; never held
//     across an `.await`.
//   - Arc wrappers for components that manage their own interior mutability.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::cache::{CacheStats, FetchCache};
use crate::market_data::{PriceQuote, QuoteBoard, ReferenceData, SectorPerformance};
use crate::portfolio::{
    aggregate_portfolio_strict, AggregateReport, PortfolioBook, PortfolioError, WatchlistItem,
};
use crate::refresh::RefreshReport;
use crate::runtime_config::RuntimeConfig;

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Incremented on every meaningful state mutation.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Bearer token required by mutating endpoints; `None` rejects them all.
    pub admin_token: Option<String>,

    // ── Portfolios & watchlist ──────────────────────────────────────────
    pub book: RwLock<PortfolioBook>,

    // ── Market data ─────────────────────────────────────────────────────
    pub quote_board: Arc<QuoteBoard>,
    pub fetch_cache: Arc<FetchCache<serde_json::Value>>,
    pub sectors: RwLock<Vec<SectorPerformance>>,
    pub last_refresh: RwLock<Option<RefreshReport>>,
    /// Company profiles, search and movers; `None` when no provider is wired.
    pub reference_data: Option<Arc<dyn ReferenceData>>,

    // ── Error log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the state from `config`; the fetch cache is sized from it.
    pub fn new(config: RuntimeConfig) -> Self {
        let fetch_cache = Arc::new(FetchCache::new(
            config.cache_freshness(),
            config.cache_capacity,
        ));

        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            admin_token: None,
            book: RwLock::new(PortfolioBook::new()),
            quote_board: Arc::new(QuoteBoard::new()),
            fetch_cache,
            sectors: RwLock::new(Vec::new()),
            last_refresh: RwLock::new(None),
            reference_data: None,
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    /// Set the admin token; an empty token counts as unset.
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_reference_data(mut self, source: Arc<dyn ReferenceData>) -> Self {
        self.reference_data = Some(source);
        self
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message, evicting the oldest past
    /// [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    pub fn record_refresh(&self, report: RefreshReport) {
        *self.last_refresh.write() = Some(report);
        self.increment_version();
    }

    // ── Aggregation ─────────────────────────────────────────────────────

    /// Summary of portfolio `id` priced with the current quote board.
    pub fn portfolio_report(&self, id: &str) -> Result<AggregateReport, PortfolioError> {
        let quotes = self.quote_board.quotes();
        let book = self.book.read();
        let portfolio = book
            .get(id)
            .ok_or_else(|| PortfolioError::PortfolioNotFound(id.to_string()))?;
        Ok(aggregate_portfolio_strict(&portfolio.holdings, &quotes))
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Serialisable view of the whole service for `GET /api/v1/state`.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let now = Utc::now();
        let strict = self.runtime_config.read().strict_quotes;
        let quotes = self.quote_board.quotes();

        let (active_portfolio_id, portfolios, watchlist, mut active_summary) = {
            let book = self.book.read();
            let portfolios = book
                .portfolios()
                .iter()
                .map(|p| PortfolioHeader {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    is_default: p.is_default,
                    holdings: p.holdings.len(),
                })
                .collect();
            let summary = aggregate_portfolio_strict(&book.active().holdings, &quotes);
            (
                book.active_id().to_string(),
                portfolios,
                book.watchlist().to_vec(),
                summary,
            )
        };
        if !strict {
            active_summary.skipped.clear();
        }

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: now.timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            active_portfolio_id,
            active_summary,
            portfolios,
            watchlist,
            quotes,
            sectors: self.sectors.read().clone(),
            last_refresh: self.last_refresh.read().clone(),
            cache: self.fetch_cache.stats(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

// =============================================================================
// Serialisable snapshot types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    pub active_portfolio_id: String,
    pub active_summary: AggregateReport,
    pub portfolios: Vec<PortfolioHeader>,
    pub watchlist: Vec<WatchlistItem>,
    pub quotes: HashMap<String, PriceQuote>,
    pub sectors: Vec<SectorPerformance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<RefreshReport>,
    pub cache: CacheStats,
    pub recent_errors: Vec<ErrorRecord>,
}

/// Portfolio listing entry without its holdings.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioHeader {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub holdings: usize,
}
