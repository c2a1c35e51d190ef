//! Crop Advisor - crop recommendation training pipeline
//!
//! Trains a random-forest crop classifier from labelled soil and climate
//! readings and serves it through an explicitly constructed service object.
//!
//! # Modules
//!
//! - [`utils`] - CSV loading, validation and descriptive statistics
//! - [`preprocessing`] - median imputation, IQR outlier scan, label encoding
//! - [`feature_engineering`] - nutrient ratios, interactions, pH buckets
//! - [`training`] - decision trees, random forests, splits, metrics, engine
//! - [`optimizer`] - grid search with stratified cross-validation
//! - [`export`] - model bundle and metadata artifacts
//! - [`inference`] - [`inference::CropRecommender`] serving contract
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```no_run
//! use crop_advisor::prelude::*;
//!
//! let config = TrainingConfig::new("Crop_recommendation.csv").with_output_dir("models");
//! let outcome = TrainEngine::new(config).run()?;
//! println!("{}", outcome.report);
//!
//! let recommender = CropRecommender::load("models/crop_recommendation_model.bin")?;
//! let rec = recommender.recommend(&SoilSample::new(90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9))?;
//! println!("{} ({:.2})", rec.crop, rec.confidence);
//! # Ok::<(), crop_advisor::error::AdvisorError>(())
//! ```

pub mod error;

pub mod utils;
pub mod preprocessing;
pub mod feature_engineering;
pub mod training;
pub mod optimizer;
pub mod export;
pub mod inference;

pub mod cli;

/// Commonly used types
pub mod prelude {
    pub use crate::error::{AdvisorError, Result};
    pub use crate::export::{ArtifactWriter, ModelBundle, ModelMetadata};
    pub use crate::feature_engineering::{FeatureTransformer, PhCategory, SoilSample};
    pub use crate::inference::{CropRecommender, Recommendation};
    pub use crate::optimizer::{GridSearchCV, ParamGrid, SearchBudget};
    pub use crate::preprocessing::{LabelEncoder, MedianImputer, OutlierScan};
    pub use crate::training::{ForestParams, MaxFeatures, RandomForestClassifier, TrainEngine, TrainingConfig};
    pub use crate::utils::{CropDataset, DatasetLoader};
}
