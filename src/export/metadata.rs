//! JSON metadata record written next to the bundle

use super::ModelBundle;
use crate::error::{AdvisorError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Timestamp layout of `training_date`
pub const TRAINING_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Human-readable summary of a trained bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub training_date: String,
    pub num_features: usize,
    pub num_classes: usize,
    pub classes: Vec<String>,
    pub best_params: BTreeMap<String, serde_json::Value>,
    pub accuracy: f64,
}

impl ModelMetadata {
    pub fn from_bundle(bundle: &ModelBundle, trained_at: DateTime<Local>) -> Self {
        Self {
            model_type: "RandomForestClassifier".to_string(),
            training_date: trained_at.format(TRAINING_DATE_FORMAT).to_string(),
            num_features: bundle.feature_columns.len(),
            num_classes: bundle.label_encoder.n_classes(),
            classes: bundle.classes().to_vec(),
            best_params: bundle.best_params.to_param_map(),
            accuracy: bundle.accuracy,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AdvisorError::SerializationError(format!("Failed to serialize metadata: {}", e)))
    }

    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AdvisorError::SerializationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}
