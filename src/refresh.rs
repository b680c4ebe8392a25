// =============================================================================
// Market-Data Refresh — fan-out per tracked ticker, fan-in before storing
// =============================================================================
//
// One refresh fetches every distinct ticker concurrently and waits for all of
// them to settle.  A failing ticker is logged and listed; it never aborts its
// siblings, and its previous snapshot stays on the board.
//
// The loop refreshes immediately on start, then every
// `refresh_interval_secs`.  A pass that overruns the interval delays the next
// one instead of firing a burst.  With `strict_quotes` on, active holdings that
// still have no quote after a pass are logged.  The loop owns no shutdown
// signal; the caller aborts the task.
// =============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::market_data::{QuoteBoard, QuoteSource};

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    /// `(ticker, error)` for every ticker that could not be fetched.
    pub failed: Vec<(String, String)>,
    pub at: DateTime<Utc>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetch `tickers` concurrently and store every success on `board`.
pub async fn refresh_once<S>(source: &S, tickers: &BTreeSet<String>, board: &QuoteBoard) -> RefreshReport
where
    S: QuoteSource + ?Sized,
{
    let fetches = tickers.iter().map(|ticker| async move {
        let result = source.fetch_snapshot(ticker).await;
        (ticker.clone(), result)
    });

    let mut refreshed = Vec::new();
    let mut failed = Vec::new();

    for (ticker, result) in join_all(fetches).await {
        match result {
            Ok(snapshot) => {
                board.update(snapshot);
                refreshed.push(ticker);
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "refresh failed");
                failed.push((ticker, format!("{e:#}")));
            }
        }
    }

    debug!(ok = refreshed.len(), failed = failed.len(), "refresh pass complete");

    RefreshReport {
        refreshed,
        failed,
        at: Utc::now(),
    }
}

/// Tickers held in the active portfolio that have no quote on the board.
///
/// Always empty unless `strict_quotes` is enabled.
pub fn unpriced_active_holdings(state: &AppState) -> Vec<String> {
    if !state.runtime_config.read().strict_quotes {
        return Vec::new();
    }
    let active_id = state.book.read().active_id().to_string();
    match state.portfolio_report(&active_id) {
        Ok(report) => report.skipped,
        Err(e) => {
            warn!(error = %e, "active portfolio unavailable for strict check");
            Vec::new()
        }
    }
}

/// Run forever: refresh the tracked tickers and sector moves on a fixed
/// interval.
pub async fn run_refresh_loop(state: Arc<AppState>, source: Arc<dyn QuoteSource>) {
    let period = state.runtime_config.read().refresh_interval();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_secs = period.as_secs(), "refresh loop started");

    loop {
        // First tick completes immediately.
        interval.tick().await;

        let tickers = state.book.read().tracked_tickers();
        let report = refresh_once(source.as_ref(), &tickers, &state.quote_board).await;
        for (ticker, error) in &report.failed {
            state.push_error(format!("refresh {ticker}: {error}"));
        }

        let unpriced = unpriced_active_holdings(&state);
        if !unpriced.is_empty() {
            warn!(tickers = ?unpriced, "active portfolio has holdings without quotes");
        }

        match source.sector_performance().await {
            Ok(sectors) => *state.sectors.write() = sectors,
            Err(e) => warn!(error = %e, "sector performance unavailable"),
        }

        state.record_refresh(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{MarketSnapshot, PriceQuote};
    use crate::portfolio::Holding;
    use crate::runtime_config::RuntimeConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeSource {
        failing: &'static str,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(failing: &'static str) -> Self {
            Self {
                failing,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FakeSource {
        async fn fetch_snapshot(&self, ticker: &str) -> anyhow::Result<MarketSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker == self.failing {
                anyhow::bail!("provider timeout");
            }
            Ok(MarketSnapshot {
                quote: PriceQuote {
                    ticker: ticker.to_string(),
                    price: 10.0,
                    change_amount: 0.5,
                    change_percent: 5.0,
                    volume: None,
                    market_cap: None,
                    pe_ratio: None,
                },
                candles: Vec::new(),
                news: Vec::new(),
                rsi: None,
                fetched_at: Utc::now(),
            })
        }
    }

    fn tickers(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let source = FakeSource::new("BAD");
        let board = QuoteBoard::new();
        let report = refresh_once(&source, &tickers(&["AAPL", "BAD", "MSFT"]), &board).await;

        assert_eq!(report.refreshed, vec!["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "BAD");
        assert!(!report.is_clean());
        assert_eq!(board.len(), 2);
        assert!(board.get("BAD").is_none());
    }

    #[tokio::test]
    async fn empty_ticker_set_is_a_clean_noop() {
        let source = FakeSource::new("");
        let board = QuoteBoard::new();
        let report = refresh_once(&source, &BTreeSet::new(), &board).await;
        assert!(report.is_clean());
        assert!(report.refreshed.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn strict_mode_lists_active_holdings_left_unpriced() {
        let state = AppState::new(RuntimeConfig {
            strict_quotes: true,
            ..RuntimeConfig::default()
        });
        {
            let mut book = state.book.write();
            let active = book.active_id().to_string();
            let portfolio = book.get_mut(&active).unwrap();
            portfolio.add_holding(Holding::new("AAPL", 2.0, 100.0).unwrap());
            portfolio.add_holding(Holding::new("BAD", 1.0, 50.0).unwrap());
        }

        let source = FakeSource::new("BAD");
        let tickers = state.book.read().tracked_tickers();
        refresh_once(&source, &tickers, &state.quote_board).await;

        assert_eq!(unpriced_active_holdings(&state), vec!["BAD".to_string()]);

        state.runtime_config.write().strict_quotes = false;
        assert!(unpriced_active_holdings(&state).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_pass_delays_the_next_tick() {
        struct SlowSource {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl QuoteSource for SlowSource {
            async fn fetch_snapshot(&self, _ticker: &str) -> anyhow::Result<MarketSnapshot> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(40)).await;
                }
                anyhow::bail!("provider timeout")
            }
        }

        let state = Arc::new(AppState::new(RuntimeConfig {
            refresh_interval_secs: 15,
            ..RuntimeConfig::default()
        }));
        state.book.write().add_to_watchlist("aapl", None).unwrap();

        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
        });
        let handle = tokio::spawn(run_refresh_loop(state.clone(), source.clone()));

        // First pass runs 0s..40s. The ticks missed at 15s and 30s collapse
        // into one pass at 40s, and the schedule restarts from there.
        tokio::time::sleep(Duration::from_millis(40_500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn loop_refreshes_immediately_then_on_interval() {
        let state = Arc::new(AppState::new(RuntimeConfig {
            refresh_interval_secs: 15,
            ..RuntimeConfig::default()
        }));
        state.book.write().add_to_watchlist("aapl", None).unwrap();

        let source = Arc::new(FakeSource::new(""));
        let handle = tokio::spawn(run_refresh_loop(state.clone(), source.clone()));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(state.quote_board.get("AAPL").is_some());

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        handle.abort();
        assert!(state.last_refresh.read().is_some());
    }
}
