//! Grid search with stratified cross-validation

use super::{ParamGrid, SearchBudget};
use crate::error::{AdvisorError, Result};
use crate::training::{accuracy, CVResults, ForestParams, RandomForestClassifier, StratifiedKFold};
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Score of one evaluated candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Position in the grid enumeration
    pub candidate_idx: usize,
    pub params: ForestParams,
    pub cv: CVResults,
    pub duration_secs: f64,
}

/// Why the search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStop {
    /// Every candidate was evaluated
    Exhausted,
    /// `max_trials` reached
    TrialLimit,
    /// Wall-clock timeout reached
    Timeout,
}

/// Outcome of a grid search. Only built by [`GridSearchCV::fit`], which
/// guarantees `best_idx` points into `results`.
#[derive(Debug, Clone, Serialize)]
pub struct GridSearchResult {
    /// Successfully scored candidates, in evaluation order
    pub results: Vec<CandidateResult>,
    best_idx: usize,
    pub total_candidates: usize,
    pub n_failed: usize,
    pub stop: SearchStop,
    pub total_duration_secs: f64,
}

impl GridSearchResult {
    /// First candidate with the highest mean CV accuracy
    pub fn best(&self) -> &CandidateResult {
        &self.results[self.best_idx]
    }

    pub fn best_params(&self) -> ForestParams {
        self.best().params
    }

    pub fn best_score(&self) -> f64 {
        self.best().cv.mean_score
    }

    /// Candidates attempted, including failures
    pub fn n_evaluated(&self) -> usize {
        self.results.len() + self.n_failed
    }
}

/// Pre-sliced matrices for one fold
struct FoldData {
    x_train: Array2<f64>,
    y_train: Vec<usize>,
    x_test: Array2<f64>,
    y_test: Vec<usize>,
}

/// Exhaustive search over a [`ParamGrid`], scoring each candidate by mean
/// cross-validated accuracy.
///
/// Candidates run one after another; the folds of a candidate and the trees
/// of each fold run on the rayon pool. Every forest uses the same seed, so
/// scores are reproducible.
pub struct GridSearchCV {
    grid: ParamGrid,
    cv: StratifiedKFold,
    random_state: u64,
    budget: SearchBudget,
    cancel: Option<Arc<AtomicBool>>,
}

impl GridSearchCV {
    pub fn new(grid: ParamGrid, cv: StratifiedKFold) -> Self {
        Self {
            grid,
            cv,
            random_state: 42,
            budget: SearchBudget::default(),
            cancel: None,
        }
    }

    /// Seed shared by every fitted forest
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Flag polled before every candidate; once set, the search fails with
    /// `SearchCancelled`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::SeqCst))
    }

    pub fn fit(&self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<GridSearchResult> {
        self.grid.validate()?;
        self.budget.validate()?;

        if x.nrows() != y.len() {
            return Err(AdvisorError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let folds: Vec<FoldData> = self
            .cv
            .split(y)?
            .into_iter()
            .map(|split| FoldData {
                x_train: x.select(Axis(0), &split.train_indices),
                y_train: split.train_indices.iter().map(|&i| y[i]).collect(),
                x_test: x.select(Axis(0), &split.test_indices),
                y_test: split.test_indices.iter().map(|&i| y[i]).collect(),
            })
            .collect();

        let candidates = self.grid.candidates();
        let total = candidates.len();
        let timeout = self.budget.timeout();
        let start = Instant::now();

        info!(
            candidates = total,
            folds = folds.len(),
            fits = total * folds.len(),
            "Starting grid search"
        );

        let mut results: Vec<CandidateResult> = Vec::new();
        let mut best_idx: Option<usize> = None;
        let mut n_failed = 0;
        let mut stop = SearchStop::Exhausted;

        for (candidate_idx, params) in candidates.into_iter().enumerate() {
            if self.is_cancelled() {
                warn!(completed = candidate_idx, total, "Grid search cancelled");
                return Err(AdvisorError::SearchCancelled {
                    completed: candidate_idx,
                    total,
                });
            }

            if candidate_idx > 0 {
                if self.budget.max_trials.map_or(false, |max| candidate_idx >= max) {
                    stop = SearchStop::TrialLimit;
                    break;
                }
                if timeout.map_or(false, |t| start.elapsed() >= t) {
                    stop = SearchStop::Timeout;
                    break;
                }
            }

            let trial_start = Instant::now();
            let scores = match self.score_candidate(&params, &folds, n_classes) {
                Ok(scores) => scores,
                Err(e) => {
                    warn!(candidate = candidate_idx, params = %params, error = %e, "Candidate failed, skipping");
                    n_failed += 1;
                    continue;
                }
            };

            let cv = CVResults::from_scores(scores);
            debug!(
                candidate = candidate_idx,
                mean = cv.mean_score,
                std = cv.std_score,
                "Scored candidate"
            );

            let is_better = best_idx.map_or(true, |b| cv.mean_score > results[b].cv.mean_score);
            if is_better {
                info!(candidate = candidate_idx, score = cv.mean_score, params = %params, "New best candidate");
                best_idx = Some(results.len());
            }

            results.push(CandidateResult {
                candidate_idx,
                params,
                cv,
                duration_secs: trial_start.elapsed().as_secs_f64(),
            });
        }

        if stop != SearchStop::Exhausted {
            info!(
                evaluated = results.len() + n_failed,
                total,
                reason = ?stop,
                "Search budget exhausted"
            );
        }

        let best_idx = best_idx.ok_or_else(|| {
            AdvisorError::TrainingError(format!(
                "none of the {} evaluated candidates could be fitted",
                n_failed
            ))
        })?;

        Ok(GridSearchResult {
            results,
            best_idx,
            total_candidates: total,
            n_failed,
            stop,
            total_duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn score_candidate(&self, params: &ForestParams, folds: &[FoldData], n_classes: usize) -> Result<Vec<f64>> {
        folds
            .par_iter()
            .map(|fold| -> Result<f64> {
                let mut model = RandomForestClassifier::new(*params).with_random_state(self.random_state);
                model.fit(&fold.x_train, &fold.y_train, n_classes)?;
                let predictions = model.predict(&fold.x_test)?;
                Ok(accuracy(&fold.y_test, &predictions))
            })
            .collect()
    }
}
