//! Random forest classifier

use super::decision_tree::{argmax, DecisionTreeClassifier};
use crate::error::{AdvisorError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Strategy for the number of features drawn at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    /// Resolve against a feature count; floored and never below one.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::Fraction(f) => (n * f).floor() as usize,
            MaxFeatures::Fixed(k) => *k,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }

    fn to_json(self) -> serde_json::Value {
        match self {
            MaxFeatures::Fraction(f) => serde_json::json!(f),
            MaxFeatures::Fixed(k) => serde_json::json!(k),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxFeatures::Sqrt => write!(f, "sqrt"),
            MaxFeatures::Log2 => write!(f, "log2"),
            MaxFeatures::Fraction(frac) => write!(f, "{}", frac),
            MaxFeatures::Fixed(k) => write!(f, "{}", k),
            MaxFeatures::All => write!(f, "all"),
        }
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Unlimited depth when `None`
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String, reason: &str| AdvisorError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        };

        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", "0".into(), "must be at least 1"));
        }
        if self.max_depth == Some(0) {
            return Err(invalid("max_depth", "0".into(), "must be at least 1 or null"));
        }
        if self.min_samples_split < 2 {
            return Err(invalid(
                "min_samples_split",
                self.min_samples_split.to_string(),
                "must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(invalid("min_samples_leaf", "0".into(), "must be at least 1"));
        }
        match self.max_features {
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(invalid("max_features", f.to_string(), "fraction must be in (0, 1]"))
            }
            MaxFeatures::Fixed(0) => Err(invalid("max_features", "0".into(), "must be at least 1")),
            _ => Ok(()),
        }
    }

    /// Parameter name to JSON value, keyed in sorted order
    pub fn to_param_map(&self) -> BTreeMap<String, serde_json::Value> {
        let mut map = BTreeMap::new();
        map.insert("bootstrap".to_string(), serde_json::json!(self.bootstrap));
        map.insert("max_depth".to_string(), serde_json::json!(self.max_depth));
        map.insert("max_features".to_string(), self.max_features.to_json());
        map.insert("min_samples_leaf".to_string(), serde_json::json!(self.min_samples_leaf));
        map.insert("min_samples_split".to_string(), serde_json::json!(self.min_samples_split));
        map.insert("n_estimators".to_string(), serde_json::json!(self.n_estimators));
        map
    }
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}, min_samples_leaf={}, max_features={}, bootstrap={}",
            self.n_estimators,
            depth,
            self.min_samples_split,
            self.min_samples_leaf,
            self.max_features,
            self.bootstrap
        )
    }
}

/// Random forest over integer class codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    params: ForestParams,
    random_state: u64,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            trees: Vec::new(),
            params,
            random_state: 42,
            n_features: 0,
            n_classes: 0,
            feature_importances: None,
        }
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fit the forest. Trees are built in parallel; tree `i` draws from a
    /// generator seeded with `random_state + i`, so results do not depend on
    /// thread scheduling.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<&mut Self> {
        self.params.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(AdvisorError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(AdvisorError::InsufficientData(
                "cannot fit a forest on an empty matrix".to_string(),
            ));
        }

        let params = self.params;
        let max_features = params.max_features.resolve(n_features);
        let base_seed = self.random_state;

        let trees = (0..params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTreeClassifier> {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTreeClassifier::new()
                    .with_min_samples_split(params.min_samples_split)
                    .with_min_samples_leaf(params.min_samples_leaf)
                    .with_max_features(max_features);
                if let Some(d) = params.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit_with_rng(x, y, &sample_indices, n_classes, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.n_features = n_features;
        self.n_classes = n_classes;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    fn check_fitted(&self, n_cols: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AdvisorError::ModelNotFitted);
        }
        if n_cols != self.n_features {
            return Err(AdvisorError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", n_cols),
            });
        }
        Ok(())
    }

    fn row_proba(&self, row: ArrayView1<f64>) -> Result<Vec<f64>> {
        let mut acc = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let dist = tree.leaf_distribution(row)?;
            for (a, &p) in acc.iter_mut().zip(dist) {
                *a += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        for a in &mut acc {
            *a /= n_trees;
        }
        Ok(acc)
    }

    /// Mean of the trees' leaf distributions, one row per sample
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_fitted(x.ncols())?;

        let rows = x
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| self.row_proba(row))
            .collect::<Result<Vec<_>>>()?;

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), self.n_classes), flat)?)
    }

    /// Most probable class per sample; ties go to the lowest class code
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| argmax(&row.to_vec()))
            .collect())
    }

    /// Class probabilities for a single feature row
    pub fn predict_proba_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_fitted(row.len())?;
        self.row_proba(ArrayView1::from(row))
    }

    /// Most probable class and its probability for a single feature row
    pub fn predict_row(&self, row: &[f64]) -> Result<(usize, f64)> {
        let proba = self.predict_proba_row(row)?;
        let code = argmax(&proba);
        Ok((code, proba[code]))
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_classifier() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = [0, 0, 0, 1, 1, 1];

        let mut rf = RandomForestClassifier::new(small_params(10)).with_random_state(42);
        rf.fit(&x, &y, 2).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let correct = predictions.iter().zip(y.iter()).filter(|(p, a)| p == a).count();
        let accuracy = correct as f64 / y.len() as f64;

        assert!(accuracy >= 0.8, "Accuracy too low: {}", accuracy);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let x = array![[0.0, 0.0], [1.0, 1.0], [0.1, 0.0], [0.9, 1.0]];
        let y = [0, 1, 0, 1];

        let mut rf = RandomForestClassifier::new(small_params(10)).with_random_state(42);
        rf.fit(&x, &y, 2).unwrap();

        let proba = rf.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (4, 2));
        for row in proba.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_model() {
        let x = array![
            [1.0, 5.0, 0.3],
            [2.0, 4.0, 0.1],
            [3.0, 3.0, 0.7],
            [4.0, 2.0, 0.2],
            [5.0, 1.0, 0.9],
            [6.0, 0.0, 0.4],
        ];
        let y = [0, 0, 1, 1, 2, 2];

        let mut a = RandomForestClassifier::new(small_params(15)).with_random_state(7);
        let mut b = RandomForestClassifier::new(small_params(15)).with_random_state(7);
        a.fit(&x, &y, 3).unwrap();
        b.fit(&x, &y, 3).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_feature_importances_normalized() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = [0, 0, 1, 1];

        let mut rf = RandomForestClassifier::new(small_params(10)).with_random_state(42);
        rf.fit(&x, &y, 2).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
        assert!(importances[0] >= importances[1]);
    }

    #[test]
    fn test_predict_wrong_width() {
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let mut rf = RandomForestClassifier::new(small_params(3));
        rf.fit(&x, &[0, 1], 2).unwrap();

        assert!(matches!(
            rf.predict_row(&[0.0, 0.0, 0.0]),
            Err(AdvisorError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(15), 3);
        assert_eq!(MaxFeatures::Log2.resolve(15), 3);
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
        assert_eq!(MaxFeatures::Fixed(40).resolve(15), 15);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(15), 7);
    }

    #[test]
    fn test_param_validation() {
        let mut params = ForestParams::default();
        assert!(params.validate().is_ok());
        params.min_samples_split = 1;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_param_map_uses_null_depth() {
        let map = ForestParams::default().to_param_map();
        assert_eq!(map["max_depth"], serde_json::Value::Null);
        assert_eq!(map["max_features"], serde_json::json!("sqrt"));
        assert_eq!(map.len(), 6);
    }
}
