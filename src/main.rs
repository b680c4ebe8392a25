// =============================================================================
// Alpha Vision — Main Entry Point
// =============================================================================
//
// Loads the runtime config, seeds the watchlist, starts the refresh loop and
// the REST API, and on Ctrl+C aborts the refresh task and saves the config.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use alpha_vision::api;
use alpha_vision::api::auth::ADMIN_TOKEN_ENV;
use alpha_vision::app_state::AppState;
use alpha_vision::market_data::{MarketDataClient, QuoteSource, ReferenceData};
use alpha_vision::refresh;
use alpha_vision::runtime_config::{RuntimeConfig, CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Alpha Vision starting up");

    let config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    let api_key = std::env::var("FMP_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        warn!("FMP_API_KEY is not set — provider requests will be rejected");
    }
    let admin_token = std::env::var(ADMIN_TOKEN_ENV).ok();
    if admin_token.as_deref().map_or(true, str::is_empty) {
        warn!("{ADMIN_TOKEN_ENV} is not set — mutating endpoints are disabled");
    }

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = AppState::new(config.clone()).with_admin_token(admin_token);

    // ── 3. Market-data client ────────────────────────────────────────────
    let client = Arc::new(
        MarketDataClient::new(
            config.provider_base_url.clone(),
            api_key,
            config.request_timeout(),
            state.fetch_cache.clone(),
        )?
        .with_serve_stale_on_error(config.serve_stale_on_error)
        .with_history(config.history_interval.clone(), config.history_limit)
        .with_news_limit(config.news_limit)
        .with_rsi_period(config.indicators.rsi_period),
    );
    let reference: Arc<dyn ReferenceData> = client.clone();
    let source: Arc<dyn QuoteSource> = client;
    let state = Arc::new(state.with_reference_data(reference));

    if let Ok(list) = std::env::var("ALPHA_VISION_WATCHLIST") {
        let mut book = state.book.write();
        for ticker in list.split(',').filter(|t| !t.trim().is_empty()) {
            if let Err(e) = book.add_to_watchlist(ticker, None) {
                warn!(ticker, error = %e, "skipping watchlist seed");
            }
        }
        info!(tickers = ?book.tracked_tickers(), "Watchlist seeded from environment");
    }

    // ── 4. Refresh loop ──────────────────────────────────────────────────
    let refresh_task = tokio::spawn(refresh::run_refresh_loop(state.clone(), source));

    // ── 5. Start the API server ──────────────────────────────────────────
    let bind_addr =
        std::env::var("ALPHA_VISION_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    let server_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    refresh_task.abort();
    server_task.abort();

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Alpha Vision shut down complete.");
    Ok(())
}
