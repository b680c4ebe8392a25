// =============================================================================
// Alpha Vision Core
// =============================================================================
//
// Indicator engine, portfolio aggregation and a time-windowed fetch cache,
// wrapped in a small tokio service: a cached market-data client, a periodic
// refresh loop and an authenticated REST API.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod cache;
pub mod indicators;
pub mod market_data;
pub mod portfolio;
pub mod refresh;
pub mod runtime_config;
