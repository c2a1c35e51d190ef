//! Interquartile-range outlier scan
//!
//! Detection only: values are counted, never clipped or removed.

use crate::error::{AdvisorError, Result};
use crate::utils::stats;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fence computed for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Scan result for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub column: String,
    pub bounds: Option<OutlierBounds>,
    pub n_outliers: usize,
}

impl fmt::Display for OutlierSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bounds {
            Some(b) => write!(
                f,
                "{:<12} {:>5} outside [{:.3}, {:.3}]",
                self.column, self.n_outliers, b.lower, b.upper
            ),
            None => write!(f, "{:<12} no observed values", self.column),
        }
    }
}

/// IQR-based outlier counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierScan {
    factor: f64,
}

impl Default for OutlierScan {
    fn default() -> Self {
        Self { factor: 1.5 }
    }
}

impl OutlierScan {
    /// Scanner with fences at `factor` IQRs beyond the quartiles
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Quartile fences over the present values of one column
    pub fn bounds(&self, values: &[f64]) -> Option<OutlierBounds> {
        let sorted = stats::sorted_present(values);
        let q1 = stats::quantile_sorted(&sorted, 0.25)?;
        let q3 = stats::quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(OutlierBounds {
            q1,
            q3,
            lower: q1 - self.factor * iqr,
            upper: q3 + self.factor * iqr,
        })
    }

    /// Count values outside the fences in every column of `x`
    pub fn scan(&self, x: &Array2<f64>, columns: &[String]) -> Result<Vec<OutlierSummary>> {
        if columns.len() != x.ncols() {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} column names", x.ncols()),
                actual: format!("{} column names", columns.len()),
            });
        }

        let summaries = x
            .axis_iter(Axis(1))
            .zip(columns)
            .map(|(col, name)| {
                let values = col.to_vec();
                let bounds = self.bounds(&values);
                let n_outliers = match &bounds {
                    Some(b) => values.iter().filter(|v| !v.is_nan() && !b.contains(**v)).count(),
                    None => 0,
                };
                OutlierSummary {
                    column: name.clone(),
                    bounds,
                    n_outliers,
                }
            })
            .collect();

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_counts_values_outside_fences() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [100.0]];
        let scan = OutlierScan::default();
        let summary = scan.scan(&x, &["v".to_string()]).unwrap();
        // q1 = 2.25, q3 = 4.75, iqr = 2.5, upper = 8.5
        let bounds = summary[0].bounds.unwrap();
        assert!((bounds.q1 - 2.25).abs() < 1e-12);
        assert!((bounds.upper - 8.5).abs() < 1e-12);
        assert_eq!(summary[0].n_outliers, 1);
    }

    #[test]
    fn test_scan_does_not_modify_and_skips_nan() {
        let x = array![[1.0], [f64::NAN], [2.0], [3.0]];
        let summary = OutlierScan::new(1.5).scan(&x, &["v".to_string()]).unwrap();
        assert_eq!(summary[0].n_outliers, 0);
        assert_eq!(x[[0, 0]], 1.0);
        assert!(x[[1, 0]].is_nan());
    }

    #[test]
    fn test_empty_column_has_no_bounds() {
        let x = array![[f64::NAN], [f64::NAN]];
        let summary = OutlierScan::default().scan(&x, &["v".to_string()]).unwrap();
        assert!(summary[0].bounds.is_none());
        assert_eq!(summary[0].n_outliers, 0);
    }
}
