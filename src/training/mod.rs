//! Model training module
//!
//! Provides the classifier and the pipeline around it:
//! - CART decision trees and bagged random forests
//! - Stratified hold-out split and stratified k-fold cross-validation
//! - Accuracy, classification report and feature-importance ranking
//! - [`TrainEngine`], which runs the full batch pipeline

mod config;
mod engine;
pub mod cross_validation;
pub mod decision_tree;
pub mod metrics;
pub mod random_forest;

pub use config::TrainingConfig;
pub use engine::{TrainEngine, TrainingOutcome, TrainingReport};
pub use cross_validation::{stratified_train_test_split, CVResults, CVSplit, StratifiedKFold};
pub use decision_tree::{DecisionTreeClassifier, TreeNode};
pub use metrics::{accuracy, rank_feature_importances, ClassMetrics, ClassificationReport, FeatureImportance};
pub use random_forest::{ForestParams, MaxFeatures, RandomForestClassifier};
