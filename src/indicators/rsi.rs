// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

use serde::Serialize;

use super::{validate_period, validate_series, IndicatorError, IndicatorSeries};

/// Compute the RSI series for `series` and `period`.
///
/// The output has the same length as `series`. The first value sits at index
/// `period` (it needs `period` deltas); earlier positions are unavailable.
///
/// # Edge cases
/// - `period == 0` => `InvalidPeriod`
/// - `series.len() < period + 1` => every position unavailable
/// - average loss of zero => 100.0; no movement at all => 50.0
pub fn rsi(series: &[f64], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    validate_period(period)?;
    validate_series(series)?;

    let mut out = IndicatorSeries::unavailable(series.len());
    if series.len() <= period {
        return Ok(out);
    }

    let deltas: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    let (sum_gain, sum_loss) = deltas[..period].iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l + d.abs())
        }
    });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;
    out.set(period, rsi_from_averages(avg_gain, avg_loss));

    // deltas[j] is the move into series[j + 1].
    for (j, &delta) in deltas.iter().enumerate().skip(period) {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        out.set(j + 1, rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(out)
}

/// Coarse reading of an RSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiLabel {
    Overbought,
    Oversold,
    Neutral,
}

impl std::fmt::Display for RsiLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Oversold => write!(f, "OVERSOLD"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

pub fn rsi_label(value: f64) -> RsiLabel {
    if value >= 70.0 {
        RsiLabel::Overbought
    } else if value <= 30.0 {
        RsiLabel::Oversold
    } else {
        RsiLabel::Neutral
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
