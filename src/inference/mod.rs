//! Serving side of the pipeline
//!
//! [`CropRecommender`] loads a bundle once, rebuilds the exact training-time
//! feature transform and maps predictions back to crop names.

mod recommender;

pub use recommender::{CropRecommender, Recommendation};
