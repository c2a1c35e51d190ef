//! Search budget configuration

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits on how much of the grid is evaluated.
///
/// When a limit is hit the search stops and picks the best of the
/// candidates already scored. The first candidate is always evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Maximum number of candidates to evaluate
    pub max_trials: Option<usize>,

    /// Maximum wall-clock time in seconds
    pub timeout_secs: Option<f64>,
}

impl SearchBudget {
    /// Unlimited budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to cap the number of candidates
    pub fn with_max_trials(mut self, n: usize) -> Self {
        self.max_trials = Some(n);
        self
    }

    /// Builder method to set timeout
    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Wall-clock limit; `None` when unset or not representable
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .and_then(|t| Duration::try_from_secs_f64(t).ok())
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_trials.is_none() && self.timeout_secs.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_trials == Some(0) {
            return Err(AdvisorError::ConfigError("max_trials must be at least 1".to_string()));
        }
        if let Some(t) = self.timeout_secs {
            if let Err(e) = Duration::try_from_secs_f64(t) {
                return Err(AdvisorError::ConfigError(format!(
                    "timeout_secs must be a non-negative, representable number of seconds, got {}: {}",
                    t, e
                )));
            }
        }
        Ok(())
    }
}
