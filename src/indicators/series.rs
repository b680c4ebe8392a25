use serde::{Deserialize, Serialize};

/// Indicator output aligned index-for-index with its source price series.
///
/// `None` marks a position where the indicator cannot be computed yet (the
/// look-back window is not full). Serialises as a JSON array with `null` in
/// those positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSeries(Vec<Option<f64>>);

impl IndicatorSeries {
    /// A series of `len` unavailable positions.
    pub fn unavailable(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at `index`, or `None` if unavailable or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.0.iter().copied()
    }

    /// Most recent available value.
    pub fn latest(&self) -> Option<f64> {
        self.0.iter().rev().find_map(|v| *v)
    }

    /// Number of available positions.
    pub fn available_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    /// NaN-padded form for plotting code that expects raw floats.
    pub fn to_nan_padded(&self) -> Vec<f64> {
        self.0.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }

    pub(crate) fn set(&mut self, index: usize, value: f64) {
        self.0[index] = Some(value);
    }
}

impl From<Vec<Option<f64>>> for IndicatorSeries {
    fn from(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }
}
