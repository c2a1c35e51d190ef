//! Exhaustive hyperparameter grid for the random forest

use crate::error::{AdvisorError, Result};
use crate::training::{ForestParams, MaxFeatures};
use serde::{Deserialize, Serialize};

/// Candidate values per forest hyperparameter.
///
/// Fields are declared in alphabetical order, which is also the enumeration
/// order of [`ParamGrid::candidates`]: `bootstrap` varies slowest and
/// `n_estimators` fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub bootstrap: Vec<bool>,
    pub max_depth: Vec<Option<usize>>,
    pub max_features: Vec<MaxFeatures>,
    pub min_samples_leaf: Vec<usize>,
    pub min_samples_split: Vec<usize>,
    pub n_estimators: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            bootstrap: vec![true, false],
            max_depth: vec![Some(10), Some(20), Some(30), None],
            max_features: vec![MaxFeatures::Sqrt, MaxFeatures::Log2],
            min_samples_leaf: vec![1, 2, 4],
            min_samples_split: vec![2, 5, 10],
            n_estimators: vec![100, 200, 300],
        }
    }
}

impl ParamGrid {
    /// Four small candidates for smoke runs
    pub fn quick() -> Self {
        Self {
            bootstrap: vec![true],
            max_depth: vec![Some(10), None],
            max_features: vec![MaxFeatures::Sqrt],
            min_samples_leaf: vec![1],
            min_samples_split: vec![2],
            n_estimators: vec![20, 50],
        }
    }

    /// A grid holding exactly one candidate
    pub fn single(params: ForestParams) -> Self {
        Self {
            bootstrap: vec![params.bootstrap],
            max_depth: vec![params.max_depth],
            max_features: vec![params.max_features],
            min_samples_leaf: vec![params.min_samples_leaf],
            min_samples_split: vec![params.min_samples_split],
            n_estimators: vec![params.n_estimators],
        }
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.bootstrap.len()
            * self.max_depth.len()
            * self.max_features.len()
            * self.min_samples_leaf.len()
            * self.min_samples_split.len()
            * self.n_estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every axis must be non-empty and every candidate valid
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(AdvisorError::ConfigError(
                "parameter grid has an empty axis".to_string(),
            ));
        }
        self.candidates().iter().try_for_each(|p| p.validate())
    }

    /// Cartesian product in enumeration order
    pub fn candidates(&self) -> Vec<ForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &bootstrap in &self.bootstrap {
            for &max_depth in &self.max_depth {
                for &max_features in &self.max_features {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        for &min_samples_split in &self.min_samples_split {
                            for &n_estimators in &self.n_estimators {
                                out.push(ForestParams {
                                    n_estimators,
                                    max_depth,
                                    min_samples_split,
                                    min_samples_leaf,
                                    max_features,
                                    bootstrap,
                                });
                            }
                        }
                    }
                }
            }
        }
        out
    }
}
