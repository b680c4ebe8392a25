// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period` closes
// and sits at index `period - 1`.
// =============================================================================

use super::{validate_period, validate_series, IndicatorError, IndicatorSeries};

/// Compute the EMA series for `series` and look-back `period`.
///
/// The output has the same length as `series`; indices before `period - 1` are
/// unavailable.
///
/// # Edge cases
/// - `period == 0` => `InvalidPeriod`
/// - `series.len() < period` => every position unavailable
/// - non-finite input => `NonFiniteValue`
pub fn ema(series: &[f64], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    validate_period(period)?;
    validate_series(series)?;

    let mut out = IndicatorSeries::unavailable(series.len());
    if series.len() < period {
        return Ok(out);
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Seed: SMA of the first `period` values.
    let seed = series[..period].iter().sum::<f64>() / period as f64;
    out.set(period - 1, seed);

    let mut prev_ema = seed;
    for (i, &close) in series.iter().enumerate().skip(period) {
        let value = close * multiplier + prev_ema * (1.0 - multiplier);
        out.set(i, value);
        prev_ema = value;
    }

    Ok(out)
}
