//! Model export and serialization module
//!
//! A training run produces two files in the output directory:
//! - [`BUNDLE_FILE_NAME`] - the [`ModelBundle`] in a checksummed binary envelope
//! - [`METADATA_FILE_NAME`] - a [`ModelMetadata`] JSON summary

mod bundle;
mod metadata;
mod writer;

pub use bundle::ModelBundle;
pub use metadata::{ModelMetadata, TRAINING_DATE_FORMAT};
pub use writer::{ArtifactPaths, ArtifactWriter};

/// File name of the binary model bundle
pub const BUNDLE_FILE_NAME: &str = "crop_recommendation_model.bin";

/// File name of the JSON metadata record
pub const METADATA_FILE_NAME: &str = "model_metadata.json";
