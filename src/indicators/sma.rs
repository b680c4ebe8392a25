// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Unweighted mean over a sliding window of `period` values:
//   SMA_i = (x_{i-period+1} + ... + x_i) / period
//
// Each window is summed on its own. A running add/subtract sum would keep
// the rounding error of a large value long after it left the window.
// =============================================================================

use super::{validate_period, validate_series, IndicatorError, IndicatorSeries};

/// Compute the SMA series for `series` and look-back `period`.
///
/// The output has the same length as `series`. Indices before `period - 1` are
/// unavailable; when `period > series.len()` every position is unavailable.
///
/// # Errors
/// - `period == 0`
/// - any non-finite input value
pub fn sma(series: &[f64], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    validate_period(period)?;
    validate_series(series)?;

    let mut out = IndicatorSeries::unavailable(series.len());
    if series.len() < period {
        return Ok(out);
    }

    let divisor = period as f64;
    for (offset, window) in series.windows(period).enumerate() {
        let sum: f64 = window.iter().sum();
        out.set(offset + period - 1, sum / divisor);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_mean(window: &[f64]) -> f64 {
        window.iter().sum::<f64>() / window.len() as f64
    }

    #[test]
    fn sma_known_values() {
        let s = sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3).unwrap();
        assert_eq!(s.len(), 5);
        assert_eq!(s.get(0), None);
        assert_eq!(s.get(1), None);
        assert!((s.get(2).unwrap() - 20.0).abs() < 1e-10);
        assert!((s.get(3).unwrap() - 30.0).abs() < 1e-10);
        assert!((s.get(4).unwrap() - 40.0).abs() < 1e-10);
    }

    #[test]
    fn sma_empty_input() {
        assert!(sma(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn sma_period_zero_rejected() {
        assert_eq!(sma(&[1.0, 2.0], 0).unwrap_err(), IndicatorError::InvalidPeriod(0));
    }

    #[test]
    fn sma_period_longer_than_series() {
        let s = sma(&[1.0, 2.0, 3.0], 10).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.available_count(), 0);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let closes = [3.5, 1.25, 8.0];
        let s = sma(&closes, 1).unwrap();
        for (i, c) in closes.iter().enumerate() {
            assert!((s.get(i).unwrap() - c).abs() < 1e-12);
        }
    }

    #[test]
    fn sma_recovers_after_large_value_leaves_window() {
        let s = sma(&[1e16, 1.0, 1.0, 1.0, 1.0], 2).unwrap();
        assert_eq!(s.get(0), None);
        assert_eq!(s.get(1), Some(5e15));
        for i in 2..5 {
            assert_eq!(s.get(i), Some(1.0), "index {i}");
        }
    }

    #[test]
    fn sma_matches_direct_summation() {
        let closes: Vec<f64> = (0..250)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 12.5 + i as f64 * 0.01)
            .collect();
        let period = 17;
        let s = sma(&closes, period).unwrap();
        assert_eq!(s.len(), closes.len());
        for i in 0..closes.len() {
            if i < period - 1 {
                assert_eq!(s.get(i), None, "index {i} should be unavailable");
            } else {
                let expected = direct_mean(&closes[i + 1 - period..=i]);
                let got = s.get(i).unwrap();
                assert!((got - expected).abs() < 1e-9, "index {i}: got {got}, expected {expected}");
            }
        }
    }

    #[test]
    fn sma_rejects_nan() {
        let err = sma(&[1.0, f64::NAN, 3.0], 2).unwrap_err();
        assert!(matches!(err, IndicatorError::NonFiniteValue { index: 1, .. }));
    }
}
