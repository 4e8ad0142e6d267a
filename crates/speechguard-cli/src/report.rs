//! Per-file output

use serde::Serialize;
use speechguard_core::{Prediction, RiskAssessment};

/// Result for one classified file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub y_prob: Prediction,
    pub risk: Option<RiskAssessment>,
}

impl FileReport {
    /// Human-readable block
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n", self.filename);
        for (label, prob) in self.y_prob.iter() {
            out.push_str(&format!("  {:<12} {:>6.2}%\n", label, prob * 100.0));
        }
        if let Some((label, _)) = self.y_prob.top() {
            out.push_str(&format!("  verdict: {}\n", label));
        }
        match &self.risk {
            Some(risk) => out.push_str(&format!(
                "  risk: {} (trustability {:.2}%)\n",
                risk.level, risk.trustability
            )),
            None => out.push_str("  risk: n/a (model labels do not match risk config)\n"),
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speechguard_core::{assess_risk, RiskConfig};

    fn report() -> FileReport {
        let labels = vec!["human".to_string(), "nonhuman".to_string()];
        FileReport {
            filename: "call.wav".to_string(),
            y_prob: Prediction::from_parts(&labels, &[0.25, 0.75]).unwrap(),
            risk: Some(assess_risk(0.75, 0.25, &RiskConfig::default())),
        }
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["filename"], "call.wav");
        assert_eq!(json["y_prob"]["nonhuman"], 0.75);
        assert_eq!(json["risk"]["riskType"], "suspicious");
        assert_eq!(json["risk"]["trustability"], 25.0);
    }

    #[test]
    fn test_text_lists_every_label() {
        let text = report().to_text();
        assert!(text.starts_with("call.wav\n"));
        assert!(text.contains("human"));
        assert!(text.contains("75.00%"));
        assert!(text.contains("verdict: nonhuman"));
        assert!(text.contains("Medium Risk (Suspicious)"));
    }
}
