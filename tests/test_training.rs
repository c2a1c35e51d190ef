//! Integration test: training pipeline end-to-end

use crop_advisor::error::AdvisorError;
use crop_advisor::export::{BUNDLE_FILE_NAME, METADATA_FILE_NAME};
use crop_advisor::optimizer::{ParamGrid, SearchBudget, SearchStop};
use crop_advisor::training::{TrainEngine, TrainingConfig};
use crop_advisor::utils::DatasetLoader;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

const HEADER: &str = "N,P,K,temperature,humidity,ph,rainfall,label";

/// Three well separated crops, `n_per_class` rows each
fn crop_csv(n_per_class: usize) -> String {
    let mut csv = format!("{}\n", HEADER);
    for i in 0..n_per_class {
        let j = (i % 10) as f64;
        writeln!(csv, "{},{},{},{},{},{},{},rice", 80.0 + j, 45.0 + j, 40.0, 23.0, 82.0, 6.2 + j * 0.02, 220.0 + j).unwrap();
        writeln!(csv, "{},{},{},{},{},{},{},maize", 78.0 - j, 48.0, 20.0 + j, 22.0, 65.0, 6.0, 85.0 + j).unwrap();
        writeln!(csv, "{},{},{},{},{},{},{},chickpea", 40.0 + j, 68.0, 80.0, 18.0 + j * 0.1, 16.0, 7.3, 80.0 - j).unwrap();
    }
    csv
}

fn write_csv(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("crops.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

fn quick_config(data: &Path, out: &Path) -> TrainingConfig {
    TrainingConfig::new(data)
        .with_output_dir(out)
        .with_grid(ParamGrid::quick())
}

// ============================================================================
// Full runs
// ============================================================================

#[test]
fn test_run_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_csv(dir.path(), &crop_csv(50));
    let out = dir.path().join("models");

    let outcome = TrainEngine::new(quick_config(&data, &out)).run().unwrap();

    let paths = outcome.artifacts.expect("artifacts written");
    assert_eq!(paths.bundle, out.join(BUNDLE_FILE_NAME));
    assert_eq!(paths.metadata, out.join(METADATA_FILE_NAME));
    assert!(paths.bundle.is_file());
    assert!(paths.metadata.is_file());

    let report = &outcome.report;
    assert_eq!(report.dataset.n_rows, 150);
    assert_eq!(report.n_train, 120);
    assert_eq!(report.n_test, 30);
    assert!(report.test_accuracy > 1.0 / 3.0);
    assert_eq!(report.search.n_evaluated(), ParamGrid::quick().len());
    assert_eq!(report.search.stop, SearchStop::Exhausted);
    assert_eq!(report.feature_importances.len(), 15);
}

#[test]
fn test_same_seed_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_csv(dir.path(), &crop_csv(30));
    let dataset = DatasetLoader::new().load(&data).unwrap();

    let config = quick_config(&data, dir.path()).with_cv(3);
    let first = TrainEngine::new(config.clone()).train(&dataset).unwrap();
    let second = TrainEngine::new(config).train(&dataset).unwrap();

    assert_eq!(first.report.best_params, second.report.best_params);
    assert_eq!(first.report.test_accuracy, second.report.test_accuracy);
    assert_eq!(first.report.search.best_score(), second.report.search.best_score());

    let (x, _) = dataset.select(&[0, 1, 2, 3, 4, 5]);
    let x = crop_advisor::feature_engineering::FeatureTransformer::transform(&x).unwrap();
    assert_eq!(
        first.bundle.model.predict_proba(&x).unwrap(),
        second.bundle.model.predict_proba(&x).unwrap()
    );
}

#[test]
fn test_missing_values_are_imputed() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = crop_csv(30);
    csv.push_str(",45,40,23,82,6.3,221,rice\n");
    csv.push_str("79,48,21,,65,,86,maize\n");
    let data = write_csv(dir.path(), &csv);

    let outcome = TrainEngine::new(quick_config(&data, &dir.path().join("out")).with_cv(3))
        .run()
        .unwrap();

    assert_eq!(outcome.report.dataset.total_missing(), 3);
    assert_eq!(
        outcome.report.imputed_train.total() + outcome.report.imputed_test.total(),
        3
    );
    assert!(outcome.report.test_accuracy > 1.0 / 3.0);
}

#[test]
fn test_trial_budget_stops_search() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_csv(dir.path(), &crop_csv(30));
    let dataset = DatasetLoader::new().load(&data).unwrap();

    let config = quick_config(&data, dir.path())
        .with_cv(3)
        .with_budget(SearchBudget::new().with_max_trials(2));
    let outcome = TrainEngine::new(config).train(&dataset).unwrap();

    assert_eq!(outcome.report.search.n_evaluated(), 2);
    assert_eq!(outcome.report.search.stop, SearchStop::TrialLimit);
}

#[test]
fn test_parallel_pool() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_csv(dir.path(), &crop_csv(30));
    let out = dir.path().join("models");

    let outcome = TrainEngine::new(quick_config(&data, &out).with_cv(3).with_n_jobs(2))
        .run()
        .unwrap();
    assert!(outcome.artifacts.is_some());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = quick_config(&dir.path().join("nope.csv"), &dir.path().join("out"));

    let err = TrainEngine::new(config).run().unwrap_err();
    assert!(matches!(err, AdvisorError::DatasetNotFound(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_singleton_crop_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = crop_csv(30);
    csv.push_str("10,10,10,30,50,5.0,100,coffee\n");
    let data = write_csv(dir.path(), &csv);

    let err = TrainEngine::new(quick_config(&data, &dir.path().join("out")))
        .run()
        .unwrap_err();
    match err {
        AdvisorError::InsufficientData(msg) => assert!(msg.contains("coffee")),
        other => panic!("expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_cancelled_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_csv(dir.path(), &crop_csv(30));
    let out = dir.path().join("out");

    let engine = TrainEngine::new(quick_config(&data, &out).with_cv(3));
    engine.cancel_flag().store(true, Ordering::SeqCst);

    let err = engine.run().unwrap_err();
    assert!(matches!(err, AdvisorError::SearchCancelled { completed: 0, .. }));
    assert!(!out.exists());
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_csv(dir.path(), &crop_csv(10));

    let err = TrainEngine::new(quick_config(&data, dir.path()).with_test_size(0.0))
        .run()
        .unwrap_err();
    assert!(matches!(err, AdvisorError::ConfigError(_)));
}
