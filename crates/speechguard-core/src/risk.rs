//! Risk assessment from human / non-human probabilities

use serde::{Deserialize, Serialize};

use crate::classifier::Prediction;

/// Thresholds and label names used to grade a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Label carrying the probability of a real human speaker
    pub human_label: String,
    /// Label carrying the probability of synthetic speech
    pub nonhuman_label: String,
    /// Non-human score at or above which the call is high risk
    pub high_threshold: f32,
    /// Non-human score at or above which the call is suspicious
    pub medium_threshold: f32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            human_label: String::from("human"),
            nonhuman_label: String::from("nonhuman"),
            high_threshold: 0.8,
            medium_threshold: 0.4,
        }
    }
}

impl RiskConfig {
    /// Clamp thresholds into [0, 1] with medium ≤ high
    pub fn validate(&mut self) {
        self.high_threshold = self.high_threshold.clamp(0.0, 1.0);
        self.medium_threshold = self.medium_threshold.clamp(0.0, self.high_threshold);
    }
}

/// Coarse risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskType {
    Scam,
    Suspicious,
    Safe,
}

/// Verdict shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: String,
    /// Human score as a percentage, two decimals
    pub trustability: f32,
    #[serde(rename = "riskType")]
    pub risk_type: RiskType,
}

impl RiskAssessment {
    /// Grade a prediction; `None` when either configured label is missing
    pub fn from_prediction(prediction: &Prediction, config: &RiskConfig) -> Option<Self> {
        let human = prediction.get(&config.human_label)?;
        let nonhuman = prediction.get(&config.nonhuman_label)?;
        Some(assess_risk(nonhuman, human, config))
    }
}

/// Grade a non-human / human score pair
pub fn assess_risk(nonhuman_score: f32, human_score: f32, config: &RiskConfig) -> RiskAssessment {
    let (level, risk_type) = if nonhuman_score >= config.high_threshold {
        ("High Risk (AI voice)", RiskType::Scam)
    } else if nonhuman_score >= config.medium_threshold {
        ("Medium Risk (Suspicious)", RiskType::Suspicious)
    } else {
        ("Low Risk (Human)", RiskType::Safe)
    };

    RiskAssessment {
        level: level.to_string(),
        trustability: (human_score * 100.0 * 100.0).round() / 100.0,
        risk_type,
    }
}
