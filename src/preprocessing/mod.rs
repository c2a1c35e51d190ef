//! Data preprocessing
//!
//! - [`MedianImputer`] - fills missing readings with training-split medians
//! - [`OutlierScan`] - IQR outlier counts for operator inspection
//! - [`LabelEncoder`] - crop name to class code mapping

mod imputer;
mod label_encoder;
mod outlier;

pub use imputer::{ImputationSummary, MedianImputer};
pub use label_encoder::LabelEncoder;
pub use outlier::{OutlierBounds, OutlierScan, OutlierSummary};
