//! Dataset loading and validation
//!
//! Reads the labelled agronomic CSV with polars, checks the schema and
//! converts it into a dense feature matrix plus crop labels.

use crate::error::{AdvisorError, Result};
use crate::feature_engineering::{LABEL_COLUMN, N_RAW_FEATURES, RAW_FEATURE_NAMES};
use crate::utils::stats::ColumnStats;
use ndarray::{Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// CSV loader for the crop dataset
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// Rows scanned to infer column types
    infer_schema_length: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Set how many rows are scanned for type inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load and validate a dataset file.
    ///
    /// Fails with [`AdvisorError::DatasetNotFound`] before touching the
    /// parser when the file is absent, and with
    /// [`AdvisorError::DatasetLoadError`] for anything unparsable.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<CropDataset> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AdvisorError::DatasetNotFound(path.to_path_buf()));
        }

        let start = Instant::now();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        debug!(rows = df.height(), cols = df.width(), "CSV parsed");

        let mut dataset = CropDataset::from_dataframe(&df)?;
        dataset.source = Some(path.to_path_buf());

        info!(
            path = %path.display(),
            rows = dataset.n_samples(),
            classes = dataset.class_distribution().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dataset loaded"
        );

        Ok(dataset)
    }
}

/// Validated crop dataset. Missing readings are `NaN`.
#[derive(Debug, Clone)]
pub struct CropDataset {
    features: Array2<f64>,
    labels: Vec<String>,
    feature_names: Vec<String>,
    /// Column name and type as read from the source
    schema: Vec<(String, String)>,
    source: Option<PathBuf>,
}

impl CropDataset {
    /// Build a dataset from a raw feature matrix (canonical column order)
    /// and one label per row.
    pub fn new(features: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        if features.ncols() != N_RAW_FEATURES {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} feature columns", N_RAW_FEATURES),
                actual: format!("{} feature columns", features.ncols()),
            });
        }
        if features.nrows() != labels.len() {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if labels.is_empty() {
            return Err(AdvisorError::DatasetLoadError("dataset has no rows".to_string()));
        }
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(AdvisorError::DatasetLoadError("empty crop label".to_string()));
        }

        let schema = RAW_FEATURE_NAMES
            .iter()
            .map(|n| (n.to_string(), "f64".to_string()))
            .chain(std::iter::once((LABEL_COLUMN.to_string(), "str".to_string())))
            .collect();

        Ok(Self {
            features,
            labels,
            feature_names: RAW_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            schema,
            source: None,
        })
    }

    /// Convert a polars frame, checking the required columns and types
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.height() == 0 {
            return Err(AdvisorError::DatasetLoadError("dataset has no rows".to_string()));
        }

        let n_rows = df.height();
        let mut col_data: Vec<Vec<f64>> = Vec::with_capacity(N_RAW_FEATURES);

        for name in RAW_FEATURE_NAMES {
            let column = df
                .column(name)
                .map_err(|_| AdvisorError::DatasetLoadError(format!("missing required column '{}'", name)))?;
            let original_nulls = column.null_count();

            let as_f64 = column.cast(&DataType::Float64).map_err(|e| {
                AdvisorError::DatasetLoadError(format!("column '{}' is not numeric: {}", name, e))
            })?;
            if as_f64.null_count() > original_nulls {
                return Err(AdvisorError::DatasetLoadError(format!(
                    "column '{}' contains {} non-numeric values",
                    name,
                    as_f64.null_count() - original_nulls
                )));
            }

            let values: Vec<f64> = as_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            col_data.push(values);
        }

        let label_column = df
            .column(LABEL_COLUMN)
            .map_err(|_| AdvisorError::DatasetLoadError(format!("missing required column '{}'", LABEL_COLUMN)))?;
        let label_strings = label_column.cast(&DataType::String)?;
        let mut labels = Vec::with_capacity(n_rows);
        let mut missing_labels = 0usize;
        for value in label_strings.str()?.into_iter() {
            match value.map(str::trim) {
                Some(label) if !label.is_empty() => labels.push(label.to_string()),
                _ => missing_labels += 1,
            }
        }
        if missing_labels > 0 {
            return Err(AdvisorError::DatasetLoadError(format!(
                "column '{}' has {} missing values",
                LABEL_COLUMN, missing_labels
            )));
        }

        let features = Array2::from_shape_fn((n_rows, N_RAW_FEATURES), |(r, c)| col_data[c][r]);

        let schema = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect();

        Ok(Self {
            features,
            labels,
            feature_names: RAW_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            schema,
            source: None,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Raw feature matrix, columns ordered like [`RAW_FEATURE_NAMES`]
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Rows at `indices` as a new matrix and label list
    pub fn select(&self, indices: &[usize]) -> (Array2<f64>, Vec<String>) {
        let x = self.features.select(Axis(0), indices);
        let y = indices.iter().map(|&i| self.labels[i].clone()).collect();
        (x, y)
    }

    /// Samples per crop, sorted by crop name
    pub fn class_distribution(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// Missing readings per raw feature column
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.feature_names
            .iter()
            .zip(self.features.axis_iter(Axis(1)))
            .map(|(name, col)| (name.clone(), col.iter().filter(|v| v.is_nan()).count()))
            .collect()
    }

    /// Shape, schema, missingness, summary statistics and class balance
    pub fn describe(&self) -> DatasetReport {
        let stats = self
            .feature_names
            .iter()
            .zip(self.features.axis_iter(Axis(1)))
            .map(|(name, col)| ColumnStats::compute(name.clone(), &col.to_vec()))
            .collect();

        let mut missing = self.missing_counts();
        missing.push((LABEL_COLUMN.to_string(), 0));

        DatasetReport {
            n_rows: self.n_samples(),
            n_cols: self.schema.len(),
            schema: self.schema.clone(),
            missing,
            stats,
            class_distribution: self.class_distribution(),
        }
    }
}

/// Operator-facing summary of a loaded dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub n_rows: usize,
    pub n_cols: usize,
    pub schema: Vec<(String, String)>,
    pub missing: Vec<(String, usize)>,
    pub stats: Vec<ColumnStats>,
    pub class_distribution: Vec<(String, usize)>,
}

impl DatasetReport {
    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|(_, n)| n).sum()
    }
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: {} rows x {} columns", self.n_rows, self.n_cols)?;

        writeln!(f, "\nColumns:")?;
        for (name, dtype) in &self.schema {
            writeln!(f, "  {:<14} {}", name, dtype)?;
        }

        writeln!(f, "\nMissing values:")?;
        for (name, count) in &self.missing {
            writeln!(f, "  {:<14} {}", name, count)?;
        }

        writeln!(
            f,
            "\n  {:<12} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for s in &self.stats {
            writeln!(
                f,
                "  {:<12} {:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                s.name, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
            )?;
        }

        writeln!(f, "\nClass distribution:")?;
        for (label, count) in &self.class_distribution {
            writeln!(f, "  {:<14} {}", label, count)?;
        }
        Ok(())
    }
}
