//! Derived agronomic features
//!
//! Turns the 7 raw soil and climate readings into the model's feature
//! vector: the raw readings, nutrient ratios and sums, a temperature and
//! humidity interaction, and the one-hot pH bucket. Training and serving
//! both go through [`FeatureTransformer`], so the column layout cannot drift.

use super::ph::PhCategory;
use super::{ENGINEERED_FEATURE_NAMES, N_RAW_FEATURES, RAW_FEATURE_NAMES};
use crate::error::{AdvisorError, Result};
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One set of raw readings for a field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    /// Nitrogen
    pub n: f64,
    /// Phosphorus
    pub p: f64,
    /// Potassium
    pub k: f64,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    pub ph: f64,
    /// Rainfall in millimetres
    pub rainfall: f64,
}

impl SoilSample {
    pub fn new(n: f64, p: f64, k: f64, temperature: f64, humidity: f64, ph: f64, rainfall: f64) -> Self {
        Self { n, p, k, temperature, humidity, ph, rainfall }
    }

    /// Build from values ordered like [`RAW_FEATURE_NAMES`]
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() != N_RAW_FEATURES {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} raw values", N_RAW_FEATURES),
                actual: format!("{} raw values", values.len()),
            });
        }
        Ok(Self::new(
            values[0], values[1], values[2], values[3], values[4], values[5], values[6],
        ))
    }

    /// Values ordered like [`RAW_FEATURE_NAMES`]
    pub fn to_array(&self) -> [f64; N_RAW_FEATURES] {
        [self.n, self.p, self.k, self.temperature, self.humidity, self.ph, self.rainfall]
    }

    /// Nitrogen to phosphorus ratio; the +1 keeps a zero reading finite.
    pub fn n_p_ratio(&self) -> f64 {
        self.n / (self.p + 1.0)
    }

    pub fn n_k_ratio(&self) -> f64 {
        self.n / (self.k + 1.0)
    }

    pub fn temp_humidity(&self) -> f64 {
        self.temperature * self.humidity / 100.0
    }

    pub fn nutrient_sum(&self) -> f64 {
        self.n + self.p + self.k
    }

    pub fn ph_category(&self) -> Option<PhCategory> {
        PhCategory::from_ph(self.ph)
    }
}

/// Stateless transform from raw readings to the model feature vector
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureTransformer;

impl FeatureTransformer {
    /// Ordered names of the produced columns
    pub fn feature_columns() -> Vec<String> {
        RAW_FEATURE_NAMES
            .iter()
            .chain(ENGINEERED_FEATURE_NAMES.iter())
            .map(|s| s.to_string())
            .chain(PhCategory::column_names())
            .collect()
    }

    /// Width of the produced feature vector
    pub fn n_features() -> usize {
        N_RAW_FEATURES + ENGINEERED_FEATURE_NAMES.len() + PhCategory::ALL.len() - 1
    }

    /// Feature vector for a single sample
    pub fn transform_sample(sample: &SoilSample) -> Vec<f64> {
        let mut row = Vec::with_capacity(Self::n_features());
        row.extend_from_slice(&sample.to_array());
        row.push(sample.n_p_ratio());
        row.push(sample.n_k_ratio());
        row.push(sample.temp_humidity());
        row.push(sample.nutrient_sum());
        row.extend_from_slice(&PhCategory::one_hot(sample.ph));
        row
    }

    /// Feature vector for a row of raw values
    pub fn transform_row(raw: &[f64]) -> Result<Vec<f64>> {
        let sample = SoilSample::from_slice(raw)?;
        Ok(Self::transform_sample(&sample))
    }

    /// Transform a raw matrix (one row per sample, raw columns in canonical
    /// order) into the engineered feature matrix.
    pub fn transform(raw: &Array2<f64>) -> Result<Array2<f64>> {
        if raw.ncols() != N_RAW_FEATURES {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} columns", N_RAW_FEATURES),
                actual: format!("{} columns", raw.ncols()),
            });
        }

        let n_features = Self::n_features();
        let rows: Vec<Vec<f64>> = raw
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| Self::transform_row(&row.to_vec()))
            .collect::<Result<Vec<_>>>()?;

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((raw.nrows(), n_features), flat)?)
    }
}
