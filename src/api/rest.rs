// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  Reads are public; anything that
// mutates the book or the cache requires a valid Bearer token checked via the
// `AuthBearer` extractor.
//
// Errors are `{"error": "..."}` bodies: validation failures are 400, unknown
// portfolios / tickers are 404, provider failures on pass-through reference
// data are 502 and a missing provider is 503.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::indicators::{compute_overlays, rsi_label, IndicatorParams};
use crate::market_data::{closes, MarketSnapshot, ReferenceData};
use crate::portfolio::{allocation, canonical_ticker, Holding, PortfolioError};

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": message.to_string() })))
}

fn portfolio_error(e: PortfolioError) -> ApiError {
    let status = match e {
        PortfolioError::PortfolioNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    error(status, e)
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Status ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        // ── Portfolios ──────────────────────────────────────────────
        .route("/api/v1/portfolios", get(list_portfolios).post(create_portfolio))
        .route("/api/v1/portfolios/:id", delete(delete_portfolio))
        .route("/api/v1/portfolios/:id/activate", post(activate_portfolio))
        .route("/api/v1/portfolios/:id/holdings", post(add_holding))
        .route("/api/v1/portfolios/:id/holdings/:ticker", delete(remove_holding))
        .route("/api/v1/portfolios/:id/summary", get(portfolio_summary))
        .route("/api/v1/portfolios/:id/allocation", get(portfolio_allocation))
        // ── Watchlist ───────────────────────────────────────────────
        .route("/api/v1/watchlist", get(list_watchlist).post(add_watchlist))
        .route("/api/v1/watchlist/:ticker", delete(remove_watchlist))
        // ── Market data ─────────────────────────────────────────────
        .route("/api/v1/quotes", get(quotes))
        .route("/api/v1/quotes/:ticker", get(ticker_snapshot))
        .route("/api/v1/indicators/:ticker", get(indicators))
        .route("/api/v1/market/overview", get(market_overview))
        .route("/api/v1/companies/:ticker", get(company))
        .route("/api/v1/search", get(search))
        // ── Cache ───────────────────────────────────────────────────
        .route("/api/v1/cache/stats", get(cache_stats))
        .route("/api/v1/cache/clear", post(cache_clear))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health & state
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Portfolios
// =============================================================================

async fn list_portfolios(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let book = state.book.read();
    Json(json!({
        "active_id": book.active_id(),
        "portfolios": book.portfolios(),
    }))
}

#[derive(Deserialize)]
struct CreatePortfolio {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

async fn create_portfolio(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePortfolio>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "portfolio name must not be empty"));
    }
    let id = state.book.write().create_portfolio(name, req.description);
    state.increment_version();
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn delete_portfolio(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.book.write().delete_portfolio(&id).map_err(portfolio_error)?;
    state.increment_version();
    Ok(StatusCode::NO_CONTENT)
}

async fn activate_portfolio(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.book.write().set_active(&id).map_err(portfolio_error)?;
    state.increment_version();
    info!(portfolio = %id, "active portfolio changed");
    Ok(Json(json!({ "active_id": id })))
}

#[derive(Deserialize)]
struct AddHolding {
    ticker: String,
    quantity: f64,
    avg_cost: f64,
}

async fn add_holding(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddHolding>,
) -> Result<impl IntoResponse, ApiError> {
    let holding = Holding::new(&req.ticker, req.quantity, req.avg_cost).map_err(portfolio_error)?;
    let holding_id = {
        let mut book = state.book.write();
        book.get_mut(&id).map_err(portfolio_error)?.add_holding(holding)
    };
    state.increment_version();
    Ok((StatusCode::CREATED, Json(json!({ "holding_id": holding_id }))))
}

async fn remove_holding(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path((id, ticker)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let removed = {
        let mut book = state.book.write();
        book.get_mut(&id).map_err(portfolio_error)?.remove_holding(&ticker)
    };
    match removed {
        Some(_) => {
            state.increment_version();
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(error(
            StatusCode::NOT_FOUND,
            format!("no holding for '{ticker}' in portfolio '{id}'"),
        )),
    }
}

async fn portfolio_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut report = state.portfolio_report(&id).map_err(portfolio_error)?;
    if !state.runtime_config.read().strict_quotes {
        report.skipped.clear();
    }
    Ok(Json(report))
}

async fn portfolio_allocation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let quotes = state.quote_board.quotes();
    let book = state.book.read();
    let portfolio = book
        .get(&id)
        .ok_or_else(|| portfolio_error(PortfolioError::PortfolioNotFound(id.clone())))?;
    Ok(Json(allocation(&portfolio.holdings, &quotes)))
}

// =============================================================================
// Watchlist
// =============================================================================

async fn list_watchlist(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.book.read().watchlist().to_vec())
}

#[derive(Deserialize)]
struct AddWatch {
    ticker: String,
    #[serde(default)]
    notes: Option<String>,
}

async fn add_watchlist(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddWatch>,
) -> Result<impl IntoResponse, ApiError> {
    let added = state
        .book
        .write()
        .add_to_watchlist(&req.ticker, req.notes)
        .map_err(portfolio_error)?;
    if added {
        state.increment_version();
        Ok((StatusCode::CREATED, Json(json!({ "added": true }))))
    } else {
        Ok((StatusCode::OK, Json(json!({ "added": false }))))
    }
}

async fn remove_watchlist(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.book.write().remove_from_watchlist(&ticker) {
        Some(_) => {
            state.increment_version();
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(error(StatusCode::NOT_FOUND, format!("'{ticker}' is not on the watchlist"))),
    }
}

// =============================================================================
// Market data
// =============================================================================

async fn quotes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.quote_board.quotes())
}

/// Canonical ticker plus its board snapshot, or 404.
fn known_ticker(state: &AppState, raw: &str) -> Result<(String, MarketSnapshot), ApiError> {
    let ticker = canonical_ticker(raw).map_err(portfolio_error)?;
    match state.quote_board.get(&ticker) {
        Some(snapshot) => Ok((ticker, snapshot)),
        None => Err(error(StatusCode::NOT_FOUND, format!("no market data for '{ticker}'"))),
    }
}

async fn ticker_snapshot(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, snapshot) = known_ticker(&state, &ticker)?;
    Ok(Json(snapshot))
}

/// Per-request overrides of the configured look-backs.
#[derive(Debug, Default, Deserialize)]
struct IndicatorQuery {
    sma_period: Option<usize>,
    ema_period: Option<usize>,
    bollinger_period: Option<usize>,
    bollinger_multiplier: Option<f64>,
    rsi_period: Option<usize>,
}

impl IndicatorQuery {
    fn apply(self, mut params: IndicatorParams) -> IndicatorParams {
        params.sma_period = self.sma_period.unwrap_or(params.sma_period);
        params.ema_period = self.ema_period.unwrap_or(params.ema_period);
        params.bollinger_period = self.bollinger_period.unwrap_or(params.bollinger_period);
        params.bollinger_multiplier = self.bollinger_multiplier.unwrap_or(params.bollinger_multiplier);
        params.rsi_period = self.rsi_period.unwrap_or(params.rsi_period);
        params
    }
}

async fn indicators(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<IndicatorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (ticker, snapshot) = known_ticker(&state, &ticker)?;

    let params = query.apply(state.runtime_config.read().indicators.clone());
    let series = closes(&snapshot.candles);
    let overlays =
        compute_overlays(&series, &params).map_err(|e| error(StatusCode::BAD_REQUEST, e))?;
    let latest_rsi = overlays.rsi.latest();

    Ok(Json(json!({
        "ticker": ticker,
        "params": params,
        "times": snapshot.candles.iter().map(|c| c.time.as_str()).collect::<Vec<_>>(),
        "closes": series,
        "overlays": overlays,
        "rsi": latest_rsi,
        "rsi_label": latest_rsi.map(rsi_label),
    })))
}

// =============================================================================
// Reference data
// =============================================================================

fn reference_data(state: &AppState) -> Result<Arc<dyn ReferenceData>, ApiError> {
    state
        .reference_data
        .clone()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "no market-data provider configured"))
}

async fn market_overview(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let source = reference_data(&state)?;
    Ok(Json(source.market_overview().await))
}

/// Profile is required; missing financials degrade to an empty list.
async fn company(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ticker = canonical_ticker(&ticker).map_err(portfolio_error)?;
    let source = reference_data(&state)?;

    let (profile, financials) =
        tokio::join!(source.company_profile(&ticker), source.financials(&ticker));
    let profile = profile.map_err(|e| error(StatusCode::BAD_GATEWAY, format!("{e:#}")))?;
    let financials = financials.unwrap_or_else(|e| {
        warn!(ticker = %ticker, error = %e, "financials unavailable");
        Vec::new()
    });

    Ok(Json(json!({
        "profile": profile,
        "financials": financials,
    })))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let source = reference_data(&state)?;
    let results = source
        .search(&params.query)
        .await
        .map_err(|e| error(StatusCode::BAD_GATEWAY, format!("{e:#}")))?;
    Ok(Json(results))
}

// =============================================================================
// Cache
// =============================================================================

async fn cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.fetch_cache.stats())
}

async fn cache_clear(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dropped = state.fetch_cache.len();
    state.fetch_cache.clear();
    info!(dropped, "fetch cache cleared");
    Json(json!({ "cleared": dropped }))
}

// =============================================================================
// Tests
// =============================================================================
