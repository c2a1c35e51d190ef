//! Hyperparameter search
//!
//! - [`ParamGrid`] - the candidate values per forest hyperparameter
//! - [`SearchBudget`] - trial and wall-clock limits
//! - [`GridSearchCV`] - exhaustive search scored by stratified k-fold accuracy

mod config;
mod grid_search;
mod search_space;

pub use config::SearchBudget;
pub use grid_search::{CandidateResult, GridSearchCV, GridSearchResult, SearchStop};
pub use search_space::ParamGrid;
