//! Feature engineering
//!
//! Provides the canonical raw input layout and the deterministic transform
//! from raw readings to model features:
//! - [`SoilSample`] - typed raw readings
//! - [`FeatureTransformer`] - ratios, interactions and pH one-hot columns
//! - [`PhCategory`] - ordinal pH buckets

mod agronomic;
mod ph;

pub use agronomic::{FeatureTransformer, SoilSample};
pub use ph::{PhCategory, PH_BIN_EDGES, PH_COLUMN_PREFIX};

/// Number of raw numeric inputs
pub const N_RAW_FEATURES: usize = 7;

/// Raw input columns in canonical order
pub const RAW_FEATURE_NAMES: [&str; N_RAW_FEATURES] =
    ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Name of the crop label column
pub const LABEL_COLUMN: &str = "label";

/// Derived numeric columns, appended after the raw inputs
pub const ENGINEERED_FEATURE_NAMES: [&str; 4] = ["N_P_ratio", "N_K_ratio", "temp_humidity", "nutrient_sum"];
