//! Descriptive statistics over plain `f64` slices
//!
//! All helpers skip `NaN` values, which stand for missing readings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Collect the finite-or-infinite (non-NaN) values in ascending order.
pub fn sorted_present(values: &[f64]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    present
}

/// Quantile of an already sorted slice using linear interpolation between
/// the two nearest ranks. Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median of the present values.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted_present(values), 0.5)
}

/// Summary statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnStats {
    /// Compute the statistics of `values`, ignoring missing entries.
    /// Every field is `NaN` when no value is present.
    pub fn compute(name: impl Into<String>, values: &[f64]) -> Self {
        let sorted = sorted_present(values);
        let count = sorted.len();
        let nan = f64::NAN;

        let mean = if count > 0 {
            sorted.iter().sum::<f64>() / count as f64
        } else {
            nan
        };
        let std = if count > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            nan
        };

        Self {
            name: name.into(),
            count,
            mean,
            std,
            min: sorted.first().copied().unwrap_or(nan),
            q25: quantile_sorted(&sorted, 0.25).unwrap_or(nan),
            median: quantile_sorted(&sorted, 0.5).unwrap_or(nan),
            q75: quantile_sorted(&sorted, 0.75).unwrap_or(nan),
            max: sorted.last().copied().unwrap_or(nan),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_median_skips_nan() {
        assert_eq!(median(&[1.0, f64::NAN, 5.0, 3.0]), Some(3.0));
        assert_eq!(median(&[f64::NAN]), None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(2.0));
        assert_eq!(quantile_sorted(&sorted, 0.75), Some(4.0));

        let sorted = [1.0, 2.0, 3.0, 4.0];
        let q1 = quantile_sorted(&sorted, 0.25).unwrap();
        assert!((q1 - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_column_stats() {
        let stats = ColumnStats::compute("x", &[2.0, 4.0, f64::NAN, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
    }
}
