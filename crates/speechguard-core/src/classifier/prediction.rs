//! Prediction result: label → probability

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::{ClassifierError, Result};

/// Probability per label, one entry for every label the model knows
///
/// Values are the model's raw outputs; nothing is renormalized here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Prediction {
    scores: BTreeMap<String, f32>,
}

impl Prediction {
    /// Pair labels with the probability at the same index
    pub fn from_parts(labels: &[String], probabilities: &[f32]) -> Result<Self> {
        if labels.len() != probabilities.len() {
            return Err(ClassifierError::ModelSchema(format!(
                "{} labels but {} probabilities",
                labels.len(),
                probabilities.len()
            )));
        }

        let scores: BTreeMap<String, f32> = labels
            .iter()
            .cloned()
            .zip(probabilities.iter().copied())
            .collect();

        if scores.len() != labels.len() {
            return Err(ClassifierError::ModelSchema("duplicate labels".to_string()));
        }

        Ok(Self { scores })
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.scores.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.scores.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Highest-probability label
    pub fn top(&self) -> Option<(&str, f32)> {
        self.iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["human".to_string(), "nonhuman".to_string()]
    }

    #[test]
    fn test_pairs_by_index() {
        let pred = Prediction::from_parts(&labels(), &[0.25, 0.75]).unwrap();
        assert_eq!(pred.len(), 2);
        assert_eq!(pred.get("human"), Some(0.25));
        assert_eq!(pred.get("nonhuman"), Some(0.75));
        assert_eq!(pred.get("robot"), None);
        assert_eq!(pred.top(), Some(("nonhuman", 0.75)));
    }

    #[test]
    fn test_no_renormalization() {
        let pred = Prediction::from_parts(&labels(), &[0.1, 0.2]).unwrap();
        let total: f32 = pred.iter().map(|(_, p)| p).sum();
        assert!((total - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_length_mismatch_is_schema_error() {
        let err = Prediction::from_parts(&labels(), &[1.0]).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelSchema(_)));
    }

    #[test]
    fn test_serializes_as_map() {
        let pred = Prediction::from_parts(&labels(), &[0.5, 0.5]).unwrap();
        let json = serde_json::to_string(&pred).unwrap();
        assert_eq!(json, r#"{"human":0.5,"nonhuman":0.5}"#);
    }
}
