//! Training configuration

use crate::error::{AdvisorError, Result};
use crate::optimizer::{ParamGrid, SearchBudget};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Labelled CSV to train on
    pub data_path: PathBuf,

    /// Directory receiving the bundle and metadata
    pub output_dir: PathBuf,

    /// Fraction of rows held out for the final evaluation
    pub test_size: f64,

    /// Seed for the split, the folds and every forest
    pub random_state: u64,

    /// Number of cross-validation folds
    pub cv_folds: usize,

    /// Hyperparameter grid
    pub grid: ParamGrid,

    /// Limits on the grid search
    pub budget: SearchBudget,

    /// IQR multiplier for the outlier scan
    pub outlier_iqr_factor: f64,

    /// Number of worker threads (None = rayon default)
    pub n_jobs: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("Crop_recommendation.csv"),
            output_dir: PathBuf::from("models"),
            test_size: 0.2,
            random_state: 42,
            cv_folds: 5,
            grid: ParamGrid::default(),
            budget: SearchBudget::default(),
            outlier_iqr_factor: 1.5,
            n_jobs: None,
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Default::default()
        }
    }

    /// Read a JSON config; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AdvisorError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            AdvisorError::ConfigError(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Builder method to set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method to set the hold-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to set CV folds
    pub fn with_cv(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Builder method to set the parameter grid
    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Builder method to set the search budget
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Builder method to set the worker count
    pub fn with_n_jobs(mut self, n: usize) -> Self {
        self.n_jobs = Some(n);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AdvisorError::ConfigError(format!(
                "test_size must be strictly between 0 and 1, got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(AdvisorError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if !(self.outlier_iqr_factor.is_finite() && self.outlier_iqr_factor >= 0.0) {
            return Err(AdvisorError::ConfigError(format!(
                "outlier_iqr_factor must be non-negative, got {}",
                self.outlier_iqr_factor
            )));
        }
        if self.n_jobs == Some(0) {
            return Err(AdvisorError::ConfigError("n_jobs must be at least 1".to_string()));
        }
        self.budget.validate()?;
        self.grid.validate()
    }
}
