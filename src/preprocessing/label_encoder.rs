//! Crop label encoding

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};

/// Bijective mapping between crop names and dense class codes.
///
/// Classes are stored sorted, so a crop's code is its position in the sorted
/// set of names seen at fit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the class set from every label in `labels`
    pub fn fit<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<&mut Self> {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        if classes.is_empty() {
            return Err(AdvisorError::DataError("cannot fit a label encoder on no labels".to_string()));
        }

        self.classes = classes;
        Ok(self)
    }

    /// Fit and encode in one step
    pub fn fit_transform<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<Vec<usize>> {
        self.fit(labels)?;
        self.transform(labels)
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| AdvisorError::UnknownLabel(label.to_string()))
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(AdvisorError::UnknownClassCode {
                code,
                n_classes: self.classes.len(),
            })
    }

    /// Class names ordered by code
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let labels = ["rice", "maize", "rice", "chickpea", "coffee"];
        let mut encoder = LabelEncoder::new();
        let codes = encoder.fit_transform(&labels).unwrap();

        assert_eq!(encoder.classes(), &["chickpea", "coffee", "maize", "rice"]);
        assert_eq!(codes, vec![3, 2, 3, 0, 1]);

        for code in 0..encoder.n_classes() {
            let name = encoder.decode(code).unwrap();
            assert_eq!(encoder.encode(name).unwrap(), code);
        }
        for label in labels {
            assert_eq!(encoder.decode(encoder.encode(label).unwrap()).unwrap(), label);
        }
    }

    #[test]
    fn test_unseen_code_fails() {
        let mut encoder = LabelEncoder::new();
        encoder.fit(&["rice", "maize"]).unwrap();
        assert!(matches!(
            encoder.decode(2),
            Err(AdvisorError::UnknownClassCode { code: 2, n_classes: 2 })
        ));
    }

    #[test]
    fn test_unseen_label_fails() {
        let mut encoder = LabelEncoder::new();
        encoder.fit(&["rice"]).unwrap();
        assert!(matches!(encoder.encode("jute"), Err(AdvisorError::UnknownLabel(_))));
    }

    #[test]
    fn test_empty_fit_fails() {
        let mut encoder = LabelEncoder::new();
        let labels: [&str; 0] = [];
        assert!(encoder.fit(&labels).is_err());
    }
}
