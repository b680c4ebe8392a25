// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// (divide by `period`) over the same window as the mean.

use serde::Serialize;

use super::{sma, validate_period, IndicatorError, IndicatorSeries};

/// Standard band width in standard deviations.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Upper, middle and lower bands, each aligned with the input series.
#[derive(Debug, Clone, Serialize)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Calculate Bollinger Bands for `series`.
///
/// - `middle` = SMA(series, period), bit-for-bit
/// - `upper`  = middle + `multiplier` * σ
/// - `lower`  = middle - `multiplier` * σ
///
/// Positions before `period - 1` are unavailable in all three bands.
///
/// # Errors
/// - `period == 0`
/// - non-finite input
/// - `multiplier` non-finite or negative
pub fn bollinger_bands(
    series: &[f64],
    period: usize,
    multiplier: f64,
) -> Result<BollingerBands, IndicatorError> {
    validate_period(period)?;
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(IndicatorError::InvalidMultiplier(multiplier));
    }

    let middle = sma(series, period)?;
    let mut upper = IndicatorSeries::unavailable(series.len());
    let mut lower = IndicatorSeries::unavailable(series.len());

    for (i, mean) in middle.iter().enumerate() {
        let Some(mean) = mean else { continue };
        let window = &series[i + 1 - period..=i];
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();

        upper.set(i, mean + multiplier * std_dev);
        lower.set(i, mean - multiplier * std_dev);
    }

    Ok(BollingerBands { upper, middle, lower })
}
