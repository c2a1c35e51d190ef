//! Ordinal pH categories and their one-hot encoding

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bin edges on the pH scale. Each bin is closed on the left, open on the
/// right, except the last which also includes 14.
pub const PH_BIN_EDGES: [f64; 6] = [0.0, 5.5, 6.5, 7.5, 8.5, 14.0];

/// Prefix of the one-hot pH columns
pub const PH_COLUMN_PREFIX: &str = "ph_category";

/// Soil acidity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhCategory {
    Acidic,
    SlightlyAcidic,
    Neutral,
    SlightlyAlkaline,
    Alkaline,
}

impl PhCategory {
    /// All categories in ascending pH order
    pub const ALL: [PhCategory; 5] = [
        PhCategory::Acidic,
        PhCategory::SlightlyAcidic,
        PhCategory::Neutral,
        PhCategory::SlightlyAlkaline,
        PhCategory::Alkaline,
    ];

    /// Reference level dropped from the one-hot encoding
    pub const REFERENCE: PhCategory = PhCategory::Acidic;

    /// Bucket a pH reading. A reading on a boundary belongs to the upper bin.
    /// Returns `None` for `NaN` or readings outside `[0, 14]`.
    pub fn from_ph(ph: f64) -> Option<Self> {
        if !(PH_BIN_EDGES[0]..=PH_BIN_EDGES[5]).contains(&ph) {
            return None;
        }
        let category = if ph < PH_BIN_EDGES[1] {
            PhCategory::Acidic
        } else if ph < PH_BIN_EDGES[2] {
            PhCategory::SlightlyAcidic
        } else if ph < PH_BIN_EDGES[3] {
            PhCategory::Neutral
        } else if ph < PH_BIN_EDGES[4] {
            PhCategory::SlightlyAlkaline
        } else {
            PhCategory::Alkaline
        };
        Some(category)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhCategory::Acidic => "acidic",
            PhCategory::SlightlyAcidic => "slightly_acidic",
            PhCategory::Neutral => "neutral",
            PhCategory::SlightlyAlkaline => "slightly_alkaline",
            PhCategory::Alkaline => "alkaline",
        }
    }

    /// Categories that get their own indicator column
    pub fn encoded_levels() -> impl Iterator<Item = PhCategory> {
        PhCategory::ALL.into_iter().filter(|c| *c != PhCategory::REFERENCE)
    }

    /// Names of the indicator columns, in encoding order
    pub fn column_names() -> Vec<String> {
        Self::encoded_levels()
            .map(|c| format!("{}_{}", PH_COLUMN_PREFIX, c.label()))
            .collect()
    }

    /// Indicator vector for a pH reading. The reference level and an
    /// out-of-range reading both encode as all zeros.
    pub fn one_hot(ph: f64) -> [f64; 4] {
        let mut encoded = [0.0; 4];
        if let Some(category) = Self::from_ph(ph) {
            if let Some(pos) = Self::encoded_levels().position(|c| c == category) {
                encoded[pos] = 1.0;
            }
        }
        encoded
    }
}

impl fmt::Display for PhCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
