// =============================================================================
// Market-Data REST Client — quotes, history, news, sectors, reference data
// =============================================================================
//
// Every GET goes through the shared `FetchCache`.  The cache key is the
// request URL without the `apikey` parameter, so rotating the key does not
// fragment the cache and the key never appears in logs.
//
// Provider conventions:
//   /quote/{T}                       → array with one quote object
//   /historical-chart/{interval}/{T} → bars, newest first
//   /stock_news?tickers=T&limit=N    → array of articles
//   /sector-performance              → array, percent given as "0.56%"
//   /stock_market/{list}             → gainers | losers | actives
//   /profile/{T}                     → array with one company profile
//   /search?query=Q&limit=N          → matching symbols
//   /income-statement/{T}?limit=N    → fiscal years, newest first
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::types::closes;
use super::{
    Candle, CompanyProfile, FinancialYear, MarketMover, MarketOverview, MarketSnapshot, NewsItem,
    PriceQuote, QuoteSource, ReferenceData, SearchResult, SectorPerformance,
};
use crate::cache::FetchCache;
use crate::indicators;

pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Entries kept per market-movers list.
const OVERVIEW_LIMIT: usize = 5;
const SEARCH_LIMIT: usize = 5;
/// Fiscal years of income statement requested.
const FINANCIAL_YEARS: usize = 4;

#[derive(Clone)]
pub struct MarketDataClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    cache: Arc<FetchCache<Value>>,
    serve_stale_on_error: bool,
    history_interval: String,
    history_limit: usize,
    news_limit: usize,
    rsi_period: usize,
}

impl MarketDataClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        cache: Arc<FetchCache<Value>>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "MarketDataClient initialised");

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
            cache,
            serve_stale_on_error: false,
            history_interval: "5min".to_string(),
            history_limit: 100,
            news_limit: 5,
            rsi_period: 14,
        })
    }

    /// Fall back to the last stored payload when a fetch fails.
    pub fn with_serve_stale_on_error(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    pub fn with_history(mut self, interval: impl Into<String>, limit: usize) -> Self {
        self.history_interval = interval.into();
        self.history_limit = limit;
        self
    }

    pub fn with_news_limit(mut self, limit: usize) -> Self {
        self.news_limit = limit;
        self
    }

    pub fn with_rsi_period(mut self, period: usize) -> Self {
        self.rsi_period = period;
        self
    }

    pub fn cache(&self) -> &Arc<FetchCache<Value>> {
        &self.cache
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// Cache key for `path` + `query`: the URL as sent, minus the credential.
    fn cache_key(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut key = format!("{}{}", self.base_url, path);
        for (i, (name, value)) in query.iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        key
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let key = self.cache_key(path, query);
        let url = format!("{}{}", self.base_url, path);

        let fetched = self
            .cache
            .get_or_fetch(&key, || {
                let request = self
                    .client
                    .get(&url)
                    .query(query)
                    .query(&[("apikey", self.api_key.as_str())]);
                let key = key.clone();
                async move {
                    let resp = request
                        .send()
                        .await
                        .with_context(|| format!("GET {key} request failed"))?;
                    let status = resp.status();
                    let body: Value = resp
                        .json()
                        .await
                        .with_context(|| format!("failed to parse {key} response"))?;

                    if !status.is_success() {
                        anyhow::bail!("GET {key} returned {status}: {body}");
                    }
                    if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
                        anyhow::bail!("GET {key} rejected by provider: {msg}");
                    }
                    Ok(body)
                }
            })
            .await;

        match fetched {
            Some(body) => Ok(body),
            None if self.serve_stale_on_error => match self.cache.last_known(&key) {
                Some(stale) => {
                    warn!(key = %key, "fetch failed — serving stale payload");
                    Ok(stale)
                }
                None => anyhow::bail!("GET {key} failed and no earlier payload is cached"),
            },
            None => anyhow::bail!("GET {key} failed"),
        }
    }

    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------

    #[instrument(skip(self), name = "market_data::quote")]
    pub async fn quote(&self, ticker: &str) -> Result<PriceQuote> {
        let body = self.get_json(&format!("/quote/{ticker}"), &[]).await?;
        parse_quote(ticker, &body)
    }

    /// Intraday bars, oldest first.
    #[instrument(skip(self), name = "market_data::history")]
    pub async fn history(&self, ticker: &str) -> Result<Vec<Candle>> {
        let path = format!("/historical-chart/{}/{ticker}", self.history_interval);
        let body = self.get_json(&path, &[]).await?;
        let candles = parse_candles(&body, self.history_limit)?;
        debug!(ticker, count = candles.len(), "history fetched");
        Ok(candles)
    }

    #[instrument(skip(self), name = "market_data::news")]
    pub async fn news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        let query = [
            ("tickers", ticker.to_string()),
            ("limit", self.news_limit.to_string()),
        ];
        let body = self.get_json("/stock_news", &query).await?;
        parse_news(&body)
    }

    #[instrument(skip(self), name = "market_data::sector_performance")]
    pub async fn sector_performance(&self) -> Result<Vec<SectorPerformance>> {
        let body = self.get_json("/sector-performance", &[]).await?;
        parse_sector_performance(&body)
    }

    /// Top gainers, losers and most-active tickers. A list that fails to load
    /// is left empty.
    #[instrument(skip(self), name = "market_data::market_overview")]
    pub async fn market_overview(&self) -> MarketOverview {
        let (gainers, losers, actives) = tokio::join!(
            self.movers("gainers"),
            self.movers("losers"),
            self.movers("actives")
        );
        MarketOverview {
            gainers,
            losers,
            actives,
        }
    }

    async fn movers(&self, list: &str) -> Vec<MarketMover> {
        self.get_json(&format!("/stock_market/{list}"), &[])
            .await
            .and_then(|body| parse_movers(&body, OVERVIEW_LIMIT))
            .unwrap_or_else(|e| {
                warn!(list, error = %e, "market movers unavailable");
                Vec::new()
            })
    }

    #[instrument(skip(self), name = "market_data::company_profile")]
    pub async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let body = self.get_json(&format!("/profile/{ticker}"), &[]).await?;
        parse_profile(ticker, &body)
    }

    /// Symbol search; a blank query matches nothing and sends no request.
    #[instrument(skip(self), name = "market_data::search")]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let params = [
            ("query", query.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        let body = self.get_json("/search", &params).await?;
        parse_search(&body)
    }

    /// Annual revenue and net income, oldest year first.
    #[instrument(skip(self), name = "market_data::financials")]
    pub async fn financials(&self, ticker: &str) -> Result<Vec<FinancialYear>> {
        let path = format!("/income-statement/{ticker}");
        let body = self
            .get_json(&path, &[("limit", FINANCIAL_YEARS.to_string())])
            .await?;
        parse_financials(&body)
    }
}

#[async_trait]
impl QuoteSource for MarketDataClient {
    /// Quote is required; history and news degrade to empty lists.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot> {
        let (quote, candles, news) =
            tokio::join!(self.quote(ticker), self.history(ticker), self.news(ticker));
        let quote = quote?;

        let candles = candles.unwrap_or_else(|e| {
            warn!(ticker, error = %e, "history unavailable");
            Vec::new()
        });
        let news = news.unwrap_or_else(|e| {
            warn!(ticker, error = %e, "news unavailable");
            Vec::new()
        });

        let rsi = indicators::rsi(&closes(&candles), self.rsi_period)
            .ok()
            .and_then(|series| series.latest());

        Ok(MarketSnapshot {
            quote,
            candles,
            news,
            rsi,
            fetched_at: Utc::now(),
        })
    }

    async fn sector_performance(&self) -> Result<Vec<SectorPerformance>> {
        MarketDataClient::sector_performance(self).await
    }
}

#[async_trait]
impl ReferenceData for MarketDataClient {
    async fn market_overview(&self) -> MarketOverview {
        MarketDataClient::market_overview(self).await
    }

    async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        MarketDataClient::company_profile(self, ticker).await
    }

    async fn financials(&self, ticker: &str) -> Result<Vec<FinancialYear>> {
        MarketDataClient::financials(self, ticker).await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        MarketDataClient::search(self, query).await
    }
}

impl std::fmt::Debug for MarketDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("serve_stale_on_error", &self.serve_stale_on_error)
            .finish()
    }
}

// =============================================================================
// Payload parsers
// =============================================================================

/// Number given either as JSON number or numeric string.
fn parse_number(val: &Value) -> Result<f64> {
    if let Some(n) = val.as_f64() {
        Ok(n)
    } else if let Some(s) = val.as_str() {
        s.trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}

/// `NaN` and infinities parse from strings like "NaN", so they are rejected
/// here rather than in `parse_number`.
fn finite_number(val: &Value, field: &str) -> Result<f64> {
    let n = parse_number(val).with_context(|| format!("invalid '{field}'"))?;
    if !n.is_finite() {
        anyhow::bail!("'{field}' is not finite");
    }
    Ok(n)
}

fn required_number(obj: &Value, field: &str) -> Result<f64> {
    let val = obj
        .get(field)
        .with_context(|| format!("missing '{field}'"))?;
    finite_number(val, field)
}

/// Absent or null fields are `None`; present garbage is still an error.
fn optional_number(obj: &Value, field: &str) -> Result<Option<f64>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(val) => finite_number(val, field).map(Some),
    }
}

fn string_field(obj: &Value, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Non-empty string, or a number rendered as text.
fn text_field(obj: &Value, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_array<'a>(body: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    body.as_array()
        .with_context(|| format!("{what} response is not an array"))
}

pub fn parse_quote(ticker: &str, body: &Value) -> Result<PriceQuote> {
    let obj = as_array(body, "quote")?
        .first()
        .with_context(|| format!("no quote returned for {ticker}"))?;

    Ok(PriceQuote {
        ticker: ticker.to_string(),
        price: required_number(obj, "price")?,
        change_amount: optional_number(obj, "change")?.unwrap_or(0.0),
        change_percent: optional_number(obj, "changesPercentage")?.unwrap_or(0.0),
        volume: optional_number(obj, "volume")?,
        market_cap: optional_number(obj, "marketCap")?,
        pe_ratio: optional_number(obj, "pe")?,
    })
}

/// Parse newest-first bars, keep the latest `limit` and return them oldest
/// first.
pub fn parse_candles(body: &Value, limit: usize) -> Result<Vec<Candle>> {
    let mut candles = as_array(body, "history")?
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, bar)| -> Result<Candle> {
            Ok(Candle {
                time: string_field(bar, "date").with_context(|| format!("bar {i} missing 'date'"))?,
                open: required_number(bar, "open").with_context(|| format!("bar {i}"))?,
                high: required_number(bar, "high").with_context(|| format!("bar {i}"))?,
                low: required_number(bar, "low").with_context(|| format!("bar {i}"))?,
                close: required_number(bar, "close").with_context(|| format!("bar {i}"))?,
                volume: optional_number(bar, "volume")
                    .with_context(|| format!("bar {i}"))?
                    .unwrap_or(0.0),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    candles.reverse();
    Ok(candles)
}

pub fn parse_news(body: &Value) -> Result<Vec<NewsItem>> {
    as_array(body, "news")?
        .iter()
        .enumerate()
        .map(|(i, item)| -> Result<NewsItem> {
            Ok(NewsItem {
                title: string_field(item, "title")
                    .with_context(|| format!("article {i} missing 'title'"))?,
                source: string_field(item, "site").unwrap_or_default(),
                published_at: string_field(item, "publishedDate").unwrap_or_default(),
                image_url: string_field(item, "image"),
                url: string_field(item, "url"),
            })
        })
        .collect()
}

pub fn parse_sector_performance(body: &Value) -> Result<Vec<SectorPerformance>> {
    as_array(body, "sector-performance")?
        .iter()
        .map(|item| -> Result<SectorPerformance> {
            let sector = string_field(item, "sector").context("sector entry missing 'sector'")?;
            let change_percent = required_number(item, "changesPercentage")
                .with_context(|| format!("sector {sector}"))?;
            Ok(SectorPerformance {
                sector,
                change_percent,
            })
        })
        .collect()
}

pub fn parse_movers(body: &Value, limit: usize) -> Result<Vec<MarketMover>> {
    as_array(body, "market movers")?
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, item)| -> Result<MarketMover> {
            let ticker =
                string_field(item, "symbol").with_context(|| format!("mover {i} missing 'symbol'"))?;
            Ok(MarketMover {
                name: string_field(item, "name").unwrap_or_else(|| ticker.clone()),
                price: required_number(item, "price").with_context(|| format!("mover {ticker}"))?,
                change_amount: optional_number(item, "change")?.unwrap_or(0.0),
                change_percent: optional_number(item, "changesPercentage")?.unwrap_or(0.0),
                ticker,
            })
        })
        .collect()
}

pub fn parse_profile(ticker: &str, body: &Value) -> Result<CompanyProfile> {
    let obj = as_array(body, "profile")?
        .first()
        .with_context(|| format!("no profile returned for {ticker}"))?;

    let region = text_field(obj, "state").or_else(|| text_field(obj, "country"));
    let headquarters = match (text_field(obj, "city"), region) {
        (Some(city), Some(region)) => Some(format!("{city}, {region}")),
        (city, region) => city.or(region),
    };

    Ok(CompanyProfile {
        ticker: ticker.to_string(),
        name: text_field(obj, "companyName").unwrap_or_else(|| ticker.to_string()),
        sector: text_field(obj, "sector"),
        description: text_field(obj, "description"),
        ceo: text_field(obj, "ceo"),
        headquarters,
        website: text_field(obj, "website"),
        employees: text_field(obj, "fullTimeEmployees"),
    })
}

pub fn parse_search(body: &Value) -> Result<Vec<SearchResult>> {
    as_array(body, "search")?
        .iter()
        .enumerate()
        .map(|(i, item)| -> Result<SearchResult> {
            let ticker =
                string_field(item, "symbol").with_context(|| format!("result {i} missing 'symbol'"))?;
            Ok(SearchResult {
                name: string_field(item, "name").unwrap_or_else(|| ticker.clone()),
                exchange: text_field(item, "exchangeShortName"),
                ticker,
            })
        })
        .collect()
}

/// Parse newest-first income statements and return them oldest first.
pub fn parse_financials(body: &Value) -> Result<Vec<FinancialYear>> {
    let mut years = as_array(body, "income-statement")?
        .iter()
        .enumerate()
        .map(|(i, item)| -> Result<FinancialYear> {
            Ok(FinancialYear {
                year: text_field(item, "calendarYear")
                    .with_context(|| format!("statement {i} missing 'calendarYear'"))?,
                revenue: required_number(item, "revenue").with_context(|| format!("statement {i}"))?,
                net_income: required_number(item, "netIncome")
                    .with_context(|| format!("statement {i}"))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    years.reverse();
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_parses_numbers_and_optional_fields() {
        let body = json!([{
            "symbol": "AAPL",
            "price": 189.5,
            "change": 1.25,
            "changesPercentage": 0.66,
            "volume": 51234567,
            "marketCap": 2.9e12,
            "pe": null
        }]);
        let q = parse_quote("AAPL", &body).unwrap();
        assert_eq!(q.ticker, "AAPL");
        assert_eq!(q.price, 189.5);
        assert_eq!(q.change_amount, 1.25);
        assert_eq!(q.volume, Some(51234567.0));
        assert_eq!(q.pe_ratio, None);
    }

    #[test]
    fn quote_rejects_empty_and_malformed() {
        assert!(parse_quote("NOPE", &json!([])).is_err());
        assert!(parse_quote("AAPL", &json!({"price": 1.0})).is_err());
        assert!(parse_quote("AAPL", &json!([{"price": "abc"}])).is_err());
        assert!(parse_quote("AAPL", &json!([{"change": 1.0}])).is_err());
    }

    #[test]
    fn quote_rejects_non_finite_optional_fields() {
        let nan_change = json!([{"price": 10.0, "change": "NaN"}]);
        assert!(parse_quote("AAPL", &nan_change).is_err());
        let inf_volume = json!([{"price": 10.0, "volume": "inf"}]);
        assert!(parse_quote("AAPL", &inf_volume).is_err());
    }

    #[test]
    fn candles_are_trimmed_and_reversed() {
        let body = json!([
            {"date": "2024-01-02 10:10:00", "open": 3.0, "high": 3.5, "low": 2.9, "close": 3.2, "volume": 10},
            {"date": "2024-01-02 10:05:00", "open": 2.0, "high": 2.5, "low": 1.9, "close": 2.2, "volume": 10},
            {"date": "2024-01-02 10:00:00", "open": 1.0, "high": 1.5, "low": 0.9, "close": 1.2, "volume": 10}
        ]);
        let candles = parse_candles(&body, 2).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, "2024-01-02 10:05:00");
        assert_eq!(candles[1].time, "2024-01-02 10:10:00");
        assert_eq!(closes(&candles), vec![2.2, 3.2]);
    }

    #[test]
    fn candle_missing_close_is_an_error() {
        let body = json!([{"date": "2024-01-02 10:00:00", "open": 1.0, "high": 1.5, "low": 0.9}]);
        assert!(parse_candles(&body, 10).is_err());
    }

    #[test]
    fn news_maps_provider_fields() {
        let body = json!([{
            "title": "Earnings beat",
            "site": "Reuters",
            "publishedDate": "2024-01-02 09:00:00",
            "image": "https://img.example/a.png",
            "url": "https://news.example/a"
        }]);
        let news = parse_news(&body).unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].source, "Reuters");
        assert_eq!(news[0].url.as_deref(), Some("https://news.example/a"));
    }

    #[test]
    fn sector_percent_strings_are_parsed() {
        let body = json!([
            {"sector": "Technology", "changesPercentage": "0.56%"},
            {"sector": "Energy", "changesPercentage": "-1.20%"}
        ]);
        let sectors = parse_sector_performance(&body).unwrap();
        assert_eq!(sectors[0].change_percent, 0.56);
        assert_eq!(sectors[1].change_percent, -1.2);
    }

    #[test]
    fn movers_are_capped() {
        let body = json!([
            {"symbol": "A", "name": "Alpha", "price": 10.0, "change": 1.0, "changesPercentage": "11.1%"},
            {"symbol": "B", "price": "5.5", "change": 0.5, "changesPercentage": 10.0},
            {"symbol": "C", "name": "Gamma", "price": 3.0, "change": 0.2, "changesPercentage": 7.1}
        ]);
        let movers = parse_movers(&body, 2).unwrap();
        assert_eq!(movers.len(), 2);
        assert_eq!(movers[0].change_percent, 11.1);
        assert_eq!(movers[1].name, "B");
        assert_eq!(movers[1].price, 5.5);
    }

    #[test]
    fn profile_builds_headquarters() {
        let body = json!([{
            "symbol": "AAPL",
            "companyName": "Apple Inc.",
            "sector": "Technology",
            "ceo": "Tim Cook",
            "city": "Cupertino",
            "state": "CA",
            "country": "US",
            "website": "https://www.apple.com",
            "fullTimeEmployees": "164000"
        }]);
        let p = parse_profile("AAPL", &body).unwrap();
        assert_eq!(p.name, "Apple Inc.");
        assert_eq!(p.headquarters.as_deref(), Some("Cupertino, CA"));
        assert_eq!(p.employees.as_deref(), Some("164000"));
        assert_eq!(p.description, None);

        let abroad = json!([{"companyName": "SAP SE", "city": "Walldorf", "state": "", "country": "DE", "fullTimeEmployees": 107000}]);
        let p = parse_profile("SAP", &abroad).unwrap();
        assert_eq!(p.headquarters.as_deref(), Some("Walldorf, DE"));
        assert_eq!(p.employees.as_deref(), Some("107000"));

        assert!(parse_profile("NONE", &json!([])).is_err());
    }

    #[test]
    fn search_maps_symbols() {
        let body = json!([
            {"symbol": "TSLA", "name": "Tesla, Inc.", "exchangeShortName": "NASDAQ"},
            {"symbol": "TL0.DE"}
        ]);
        let results = parse_search(&body).unwrap();
        assert_eq!(results[0].exchange.as_deref(), Some("NASDAQ"));
        assert_eq!(results[1].name, "TL0.DE");
        assert_eq!(results[1].exchange, None);
    }

    #[test]
    fn financials_are_oldest_first() {
        let body = json!([
            {"calendarYear": "2023", "revenue": 383.3e9, "netIncome": 97.0e9},
            {"calendarYear": 2022, "revenue": 394.3e9, "netIncome": 99.8e9}
        ]);
        let years = parse_financials(&body).unwrap();
        assert_eq!(years[0].year, "2022");
        assert_eq!(years[1].year, "2023");
        assert_eq!(years[1].net_income, 97.0e9);
        assert!(parse_financials(&json!([{"calendarYear": "2023", "revenue": 1.0}])).is_err());
    }

    #[test]
    fn cache_key_excludes_credential() {
        let cache = Arc::new(FetchCache::new(Duration::from_secs(60), 8));
        let client =
            MarketDataClient::new("http://localhost/api/v3/", "secret", Duration::from_secs(1), cache)
                .unwrap();
        let key = client.cache_key("/stock_news", &[("tickers", "AAPL".into()), ("limit", "5".into())]);
        assert_eq!(key, "http://localhost/api/v3/stock_news?tickers=AAPL&limit=5");
        assert!(!format!("{client:?}").contains("secret"));
    }
}
