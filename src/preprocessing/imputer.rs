//! Median imputation for missing numeric readings

use crate::error::{AdvisorError, Result};
use crate::utils::stats;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Replaces `NaN` entries with the per-column median learned in [`fit`].
///
/// Fit on the training rows only and reuse the learned medians for every
/// other split.
///
/// [`fit`]: MedianImputer::fit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedianImputer {
    columns: Vec<String>,
    medians: Vec<f64>,
    is_fitted: bool,
}

/// How many values were filled per column by a transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationSummary {
    pub filled: Vec<(String, usize)>,
}

impl ImputationSummary {
    pub fn total(&self) -> usize {
        self.filled.iter().map(|(_, n)| n).sum()
    }
}

impl MedianImputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn one median per column of `x`
    pub fn fit(&mut self, x: &Array2<f64>, columns: &[String]) -> Result<&mut Self> {
        if columns.len() != x.ncols() {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} column names", x.ncols()),
                actual: format!("{} column names", columns.len()),
            });
        }

        let mut medians = Vec::with_capacity(x.ncols());
        for (col, name) in x.axis_iter(Axis(1)).zip(columns) {
            let values = col.to_vec();
            let median = stats::median(&values).ok_or_else(|| {
                AdvisorError::DataError(format!("column '{}' has no observed values to impute from", name))
            })?;
            medians.push(median);
        }

        self.columns = columns.to_vec();
        self.medians = medians;
        self.is_fitted = true;
        Ok(self)
    }

    /// Fill missing values and report the per-column fill counts
    pub fn transform(&self, x: &Array2<f64>) -> Result<(Array2<f64>, ImputationSummary)> {
        if !self.is_fitted {
            return Err(AdvisorError::ModelNotFitted);
        }
        if x.ncols() != self.medians.len() {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} columns", self.medians.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut filled = x.clone();
        let mut counts = vec![0usize; self.medians.len()];
        for (j, mut col) in filled.axis_iter_mut(Axis(1)).enumerate() {
            for v in col.iter_mut() {
                if v.is_nan() {
                    *v = self.medians[j];
                    counts[j] += 1;
                }
            }
        }

        let summary = ImputationSummary {
            filled: self.columns.iter().cloned().zip(counts).collect(),
        };
        Ok((filled, summary))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>, columns: &[String]) -> Result<(Array2<f64>, ImputationSummary)> {
        self.fit(x, columns)?;
        self.transform(x)
    }

    /// Learned medians, paired with their column names
    pub fn medians(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns.iter().map(String::as_str).zip(self.medians.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{}", i)).collect()
    }

    #[test]
    fn test_single_missing_value_gets_column_median() {
        let x = array![
            [1.0, 10.0],
            [2.0, f64::NAN],
            [3.0, 30.0],
            [4.0, 50.0],
            [5.0, 20.0],
        ];
        let mut imputer = MedianImputer::new();
        let (filled, summary) = imputer.fit_transform(&x, &names(2)).unwrap();

        // median of 10, 30, 50, 20 is 25
        assert_eq!(filled[[1, 1]], 25.0);
        assert_eq!(filled.column(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.filled[1], ("c1".to_string(), 1));
    }

    #[test]
    fn test_medians_come_from_fit_data_only() {
        let train = array![[1.0], [3.0], [5.0]];
        let test = array![[f64::NAN], [100.0]];
        let mut imputer = MedianImputer::new();
        imputer.fit(&train, &names(1)).unwrap();
        let (filled, _) = imputer.transform(&test).unwrap();
        assert_eq!(filled[[0, 0]], 3.0);
        assert_eq!(filled[[1, 0]], 100.0);
    }

    #[test]
    fn test_all_missing_column_fails() {
        let x = array![[f64::NAN], [f64::NAN]];
        let mut imputer = MedianImputer::new();
        assert!(matches!(
            imputer.fit(&x, &names(1)),
            Err(AdvisorError::DataError(_))
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        let imputer = MedianImputer::new();
        let x = array![[1.0]];
        assert!(matches!(imputer.transform(&x), Err(AdvisorError::ModelNotFitted)));
    }
}
