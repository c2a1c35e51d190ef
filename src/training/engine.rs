//! Training engine implementation
//!
//! Runs the batch pipeline end to end: load, diagnose, split, impute,
//! engineer features, fit a baseline, grid-search, refit, evaluate and
//! write the artifacts.

use super::cross_validation::stratified_train_test_split;
use super::metrics::{accuracy, rank_feature_importances, ClassificationReport, FeatureImportance};
use super::{ForestParams, RandomForestClassifier, StratifiedKFold, TrainingConfig};
use crate::error::{AdvisorError, Result};
use crate::export::{ArtifactPaths, ArtifactWriter, ModelBundle};
use crate::feature_engineering::FeatureTransformer;
use crate::optimizer::{GridSearchCV, GridSearchResult};
use crate::preprocessing::{ImputationSummary, LabelEncoder, MedianImputer, OutlierScan, OutlierSummary};
use crate::utils::{CropDataset, DatasetLoader, DatasetReport};
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Diagnostics and scores collected during a run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub dataset: DatasetReport,
    pub outliers: Vec<OutlierSummary>,
    /// Medians learned on the training split
    pub imputation_medians: Vec<(String, f64)>,
    pub imputed_train: ImputationSummary,
    pub imputed_test: ImputationSummary,
    pub n_train: usize,
    pub n_test: usize,
    pub baseline_accuracy: f64,
    pub search: GridSearchResult,
    pub best_params: ForestParams,
    pub test_accuracy: f64,
    pub classification: ClassificationReport,
    pub feature_importances: Vec<FeatureImportance>,
    pub training_time_secs: f64,
}

/// Result of [`TrainEngine::train`]
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    pub report: TrainingReport,
    /// Set once the artifacts are on disk
    pub artifacts: Option<ArtifactPaths>,
}

/// Main training engine
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
    cancel: Arc<AtomicBool>,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned cancellation flag
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Flag that aborts the grid search when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load the configured dataset, train, and write the artifacts.
    /// Nothing is written unless training succeeds.
    pub fn run(&self) -> Result<TrainingOutcome> {
        self.config.validate()?;
        self.in_pool(|| {
            let dataset = DatasetLoader::new().load(&self.config.data_path)?;
            let mut outcome = self.train(&dataset)?;
            let writer = ArtifactWriter::new(&self.config.output_dir);
            outcome.artifacts = Some(writer.write(&outcome.bundle, Local::now())?);
            Ok(outcome)
        })
    }

    /// Run `f` on a dedicated pool when `n_jobs` is set
    fn in_pool<T: Send>(&self, f: impl FnOnce() -> Result<T> + Send) -> Result<T> {
        match self.config.n_jobs {
            Some(n_jobs) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n_jobs)
                    .build()
                    .map_err(|e| AdvisorError::ThreadPoolError(e.to_string()))?;
                debug!(n_jobs, "Using dedicated thread pool");
                pool.install(f)
            }
            None => f(),
        }
    }

    /// Train on an already loaded dataset without touching the filesystem
    pub fn train(&self, dataset: &CropDataset) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let start = Instant::now();
        let config = &self.config;

        let dataset_report = dataset.describe();
        info!(
            rows = dataset_report.n_rows,
            columns = dataset_report.n_cols,
            missing = dataset_report.total_missing(),
            classes = dataset_report.class_distribution.len(),
            "Dataset loaded"
        );

        let scan = OutlierScan::new(config.outlier_iqr_factor);
        let outliers = scan.scan(dataset.features(), dataset.feature_names())?;
        for summary in outliers.iter().filter(|s| s.n_outliers > 0) {
            info!(
                column = %summary.column,
                outliers = summary.n_outliers,
                factor = scan.factor(),
                "IQR outliers detected"
            );
        }

        self.check_class_sizes(dataset)?;

        let mut encoder = LabelEncoder::new();
        let y = encoder.fit_transform(dataset.labels())?;
        let n_classes = encoder.n_classes();

        let split = stratified_train_test_split(&y, config.test_size, config.random_state)?;
        let (x_train_raw, _) = dataset.select(&split.train_indices);
        let (x_test_raw, _) = dataset.select(&split.test_indices);
        let y_train: Vec<usize> = split.train_indices.iter().map(|&i| y[i]).collect();
        let y_test: Vec<usize> = split.test_indices.iter().map(|&i| y[i]).collect();
        info!(train = y_train.len(), test = y_test.len(), "Stratified split");

        self.check_fold_sizes(&y_train, &encoder)?;

        let mut imputer = MedianImputer::new();
        let (x_train_raw, imputed_train) = imputer.fit_transform(&x_train_raw, dataset.feature_names())?;
        let (x_test_raw, imputed_test) = imputer.transform(&x_test_raw)?;
        if imputed_train.total() + imputed_test.total() > 0 {
            info!(
                train = imputed_train.total(),
                test = imputed_test.total(),
                "Filled missing values with training medians"
            );
        }

        let x_train = FeatureTransformer::transform(&x_train_raw)?;
        let x_test = FeatureTransformer::transform(&x_test_raw)?;
        let feature_columns = FeatureTransformer::feature_columns();

        let mut baseline = RandomForestClassifier::new(ForestParams::default()).with_random_state(config.random_state);
        baseline.fit(&x_train, &y_train, n_classes)?;
        let baseline_accuracy = accuracy(&y_test, &baseline.predict(&x_test)?);
        info!(accuracy = baseline_accuracy, "Baseline forest");

        let search = GridSearchCV::new(
            config.grid.clone(),
            StratifiedKFold::new(config.cv_folds).with_shuffle(config.random_state),
        )
        .with_random_state(config.random_state)
        .with_budget(config.budget.clone())
        .with_cancel_flag(self.cancel_flag())
        .fit(&x_train, &y_train, n_classes)?;

        let best_params = search.best_params();
        info!(
            score = search.best_score(),
            evaluated = search.n_evaluated(),
            total = search.total_candidates,
            params = %best_params,
            "Grid search finished"
        );
        if search.n_failed > 0 {
            warn!(failed = search.n_failed, "Some candidates could not be fitted");
        }

        let mut model = RandomForestClassifier::new(best_params).with_random_state(config.random_state);
        model.fit(&x_train, &y_train, n_classes)?;

        let y_pred = model.predict(&x_test)?;
        let test_accuracy = accuracy(&y_test, &y_pred);
        let classification = ClassificationReport::compute(&y_test, &y_pred, encoder.classes())?;
        let feature_importances = model
            .feature_importances()
            .map(|imp| rank_feature_importances(&feature_columns, imp))
            .unwrap_or_default();
        info!(accuracy = test_accuracy, "Held-out evaluation");

        let report = TrainingReport {
            dataset: dataset_report,
            outliers,
            imputation_medians: imputer.medians().map(|(c, m)| (c.to_string(), m)).collect(),
            imputed_train,
            imputed_test,
            n_train: y_train.len(),
            n_test: y_test.len(),
            baseline_accuracy,
            search,
            best_params,
            test_accuracy,
            classification,
            feature_importances,
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        Ok(TrainingOutcome {
            bundle: ModelBundle::new(model, encoder, best_params, test_accuracy),
            report,
            artifacts: None,
        })
    }

    fn check_class_sizes(&self, dataset: &CropDataset) -> Result<()> {
        match dataset.class_distribution().into_iter().find(|(_, n)| *n < 2) {
            Some((label, n)) => Err(AdvisorError::InsufficientData(format!(
                "crop '{}' has {} sample(s); at least 2 per crop are needed for a stratified split",
                label, n
            ))),
            None => Ok(()),
        }
    }

    fn check_fold_sizes(&self, y_train: &[usize], encoder: &LabelEncoder) -> Result<()> {
        let mut counts = vec![0usize; encoder.n_classes()];
        for &c in y_train {
            counts[c] += 1;
        }
        match counts.iter().enumerate().find(|&(_, &n)| n < self.config.cv_folds) {
            Some((code, &n)) => Err(AdvisorError::InsufficientData(format!(
                "crop '{}' has {} training sample(s), fewer than the {} cross-validation folds",
                encoder.decode(code)?,
                n,
                self.config.cv_folds
            ))),
            None => Ok(()),
        }
    }
}

impl TrainingReport {
    /// Generate a text report
    pub fn generate_report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Crop Advisor Training Report ===")?;
        writeln!(f)?;

        writeln!(f, "--- Data Shape ---")?;
        write!(f, "{}", self.dataset)?;
        writeln!(f)?;
        writeln!(f, "Train:    {}", self.n_train)?;
        writeln!(f, "Test:     {}", self.n_test)?;
        let medians: Vec<String> = self
            .imputation_medians
            .iter()
            .map(|(column, median)| format!("{}={:.3}", column, median))
            .collect();
        writeln!(
            f,
            "Imputed:  {} train, {} test (medians: {})",
            self.imputed_train.total(),
            self.imputed_test.total(),
            medians.join(", ")
        )?;
        writeln!(f)?;

        writeln!(f, "--- Outliers (IQR) ---")?;
        for summary in &self.outliers {
            writeln!(f, "{}", summary)?;
        }
        writeln!(f)?;

        writeln!(f, "--- Model Selection ---")?;
        writeln!(f, "Baseline accuracy: {:.4}", self.baseline_accuracy)?;
        writeln!(
            f,
            "Candidates:        {} of {} evaluated ({:?})",
            self.search.n_evaluated(),
            self.search.total_candidates,
            self.search.stop
        )?;
        writeln!(
            f,
            "Best CV accuracy:  {:.4} (+/- {:.4})",
            self.search.best_score(),
            self.search.best().cv.std_score
        )?;
        writeln!(f, "Best params:       {}", self.best_params)?;
        writeln!(f)?;

        writeln!(f, "--- Held-out Evaluation ---")?;
        writeln!(f, "Accuracy: {:.4}", self.test_accuracy)?;
        writeln!(f)?;
        write!(f, "{}", self.classification)?;
        writeln!(f)?;

        writeln!(f, "--- Feature Importance ---")?;
        for (rank, fi) in self.feature_importances.iter().enumerate() {
            writeln!(f, "{:>2}. {:<30} {:.4}", rank + 1, fi.feature, fi.importance)?;
        }
        writeln!(f)?;

        writeln!(f, "--- Training Time ---")?;
        writeln!(f, "{:.2} seconds", self.training_time_secs)
    }
}
