// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators drawn on top of a
// ticker's price history.  Every series-producing function returns an
// `IndicatorSeries` of exactly the input length: positions where the look-back
// window is not yet full hold `None`, so charts keep positional alignment.
//
// Short input is not an error (it degrades to unavailable positions).  Only
// genuinely invalid input is rejected: a zero period, a non-finite price, or a
// non-finite / negative band multiplier.

pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod series;
pub mod sma;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bollinger::{bollinger_bands, BollingerBands, DEFAULT_MULTIPLIER};
pub use ema::ema;
pub use rsi::{rsi, rsi_label, RsiLabel};
pub use series::IndicatorSeries;
pub use sma::sma;

/// Reasons an indicator computation refuses its input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("period must be at least 1 (got {0})")]
    InvalidPeriod(usize),

    #[error("non-finite value {value} at index {index}")]
    NonFiniteValue { index: usize, value: f64 },

    #[error("band multiplier must be finite and non-negative (got {0})")]
    InvalidMultiplier(f64),
}

pub(crate) fn validate_period(period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    Ok(())
}

pub(crate) fn validate_series(series: &[f64]) -> Result<(), IndicatorError> {
    match series.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(IndicatorError::NonFiniteValue {
            index,
            value: series[index],
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Overlay bundle
// =============================================================================

/// Look-back settings for the standard overlay bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_multiplier")]
    pub bollinger_multiplier: f64,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
}

fn default_sma_period() -> usize {
    20
}

fn default_ema_period() -> usize {
    12
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

fn default_rsi_period() -> usize {
    14
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_period: default_sma_period(),
            ema_period: default_ema_period(),
            bollinger_period: default_bollinger_period(),
            bollinger_multiplier: default_bollinger_multiplier(),
            rsi_period: default_rsi_period(),
        }
    }
}

/// Every overlay the dashboard draws for one price series.
#[derive(Debug, Clone, Serialize)]
pub struct Overlays {
    pub sma: IndicatorSeries,
    pub ema: IndicatorSeries,
    pub bollinger: BollingerBands,
    pub rsi: IndicatorSeries,
}

/// Compute SMA, EMA, Bollinger Bands and RSI for `series` in one pass over the
/// parameters.
pub fn compute_overlays(series: &[f64], params: &IndicatorParams) -> Result<Overlays, IndicatorError> {
    Ok(Overlays {
        sma: sma(series, params.sma_period)?,
        ema: ema(series, params.ema_period)?,
        bollinger: bollinger_bands(series, params.bollinger_period, params.bollinger_multiplier)?,
        rsi: rsi(series, params.rsi_period)?,
    })
}
