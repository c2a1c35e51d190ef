//! Crop recommendation service over a loaded bundle

use crate::error::{AdvisorError, Result};
use crate::export::ModelBundle;
use crate::feature_engineering::{FeatureTransformer, SoilSample, RAW_FEATURE_NAMES};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A single recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop: String,
    pub class_code: usize,
    /// Forest probability of the recommended class
    pub confidence: f64,
}

/// Immutable prediction service.
///
/// Construct once at start-up and share by reference or `Arc`; there is no
/// process-wide model.
#[derive(Debug, Clone)]
pub struct CropRecommender {
    bundle: ModelBundle,
}

impl CropRecommender {
    /// Wrap an in-memory bundle after checking its feature layout
    pub fn new(bundle: ModelBundle) -> Result<Self> {
        let expected = FeatureTransformer::feature_columns();
        if bundle.feature_columns != expected {
            return Err(AdvisorError::SerializationError(format!(
                "bundle feature columns {:?} do not match the transform's {:?}",
                bundle.feature_columns, expected
            )));
        }
        if bundle.model.n_features() != expected.len() {
            return Err(AdvisorError::SerializationError(format!(
                "bundle model expects {} features, transform produces {}",
                bundle.model.n_features(),
                expected.len()
            )));
        }
        if bundle.model.n_classes() != bundle.label_encoder.n_classes() {
            return Err(AdvisorError::SerializationError(format!(
                "model has {} classes but label encoder has {}",
                bundle.model.n_classes(),
                bundle.label_encoder.n_classes()
            )));
        }
        Ok(Self { bundle })
    }

    /// Load and verify a bundle file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let recommender = Self::new(ModelBundle::load(path)?)?;
        info!(
            path = %path.display(),
            classes = recommender.bundle.label_encoder.n_classes(),
            accuracy = recommender.bundle.accuracy,
            "Loaded crop model"
        );
        Ok(recommender)
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn crops(&self) -> &[String] {
        self.bundle.classes()
    }

    fn check_sample(sample: &SoilSample) -> Result<()> {
        let values = sample.to_array();
        match RAW_FEATURE_NAMES.iter().zip(values).find(|(_, v)| !v.is_finite()) {
            Some((name, v)) => Err(AdvisorError::DataError(format!("{} must be a finite number, got {}", name, v))),
            None => Ok(()),
        }
    }

    /// Probability per crop for one sample, in class-code order
    pub fn probabilities(&self, sample: &SoilSample) -> Result<Vec<f64>> {
        Self::check_sample(sample)?;
        let row = FeatureTransformer::transform_sample(sample);
        self.bundle.model.predict_proba_row(&row)
    }

    /// Recommended crop for one sample
    pub fn recommend(&self, sample: &SoilSample) -> Result<Recommendation> {
        Self::check_sample(sample)?;
        let row = FeatureTransformer::transform_sample(sample);
        let (class_code, confidence) = self.bundle.model.predict_row(&row)?;
        let crop = self.bundle.label_encoder.decode(class_code)?.to_string();
        Ok(Recommendation {
            crop,
            class_code,
            confidence,
        })
    }

    /// The `k` most probable crops, best first; ties keep class-code order
    pub fn top_k(&self, sample: &SoilSample, k: usize) -> Result<Vec<Recommendation>> {
        let proba = self.probabilities(sample)?;
        let mut ranked: Vec<(usize, f64)> = proba.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
            .into_iter()
            .take(k)
            .map(|(class_code, confidence)| {
                Ok(Recommendation {
                    crop: self.bundle.label_encoder.decode(class_code)?.to_string(),
                    class_code,
                    confidence,
                })
            })
            .collect()
    }

    /// Recommendations for many samples, computed in parallel
    pub fn recommend_batch(&self, samples: &[SoilSample]) -> Result<Vec<Recommendation>> {
        samples.par_iter().map(|s| self.recommend(s)).collect()
    }
}
