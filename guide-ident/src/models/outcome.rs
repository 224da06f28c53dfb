//! Classification results and capture outcomes

use guide_common::Landmark;
use serde::{Deserialize, Serialize};

/// Which classifier produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierOrigin {
    Remote,
    Local,
}

/// A label with its confidence, as produced by either classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Predicted landmark label (server name or on-device class tag)
    pub label: String,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Which classifier produced this
    pub origin: ClassifierOrigin,
}

impl ClassificationResult {
    /// Confidence as a whole percentage for user-facing messages
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Final outcome of an identification capture
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IdentOutcome {
    /// Classifier was confident and the label matched a directory entry
    Resolved {
        landmark: Landmark,
        label: String,
        confidence: f64,
        origin: ClassifierOrigin,
    },

    /// Classifier answered below the confidence threshold
    LowConfidence { label: String, confidence: f64 },

    /// Confident label with no matching directory entry
    NotFound { label: String, confidence: f64 },
}

impl IdentOutcome {
    /// Human-readable summary for clients
    pub fn message(&self) -> String {
        match self {
            IdentOutcome::Resolved { landmark, .. } => {
                format!("Identified landmark: {}", landmark.name)
            }
            IdentOutcome::LowConfidence { confidence, .. } => format!(
                "Confidence too low to identify the landmark ({}%)",
                (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
            ),
            IdentOutcome::NotFound { label, .. } => {
                format!("No landmark entry found for \"{}\"", label)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_percent_rounds() {
        let result = ClassificationResult {
            label: "novat".to_string(),
            confidence: 0.554,
            origin: ClassifierOrigin::Local,
        };
        assert_eq!(result.confidence_percent(), 55);
    }

    #[test]
    fn low_confidence_message_carries_percentage() {
        let outcome = IdentOutcome::LowConfidence {
            label: "old_house".to_string(),
            confidence: 0.55,
        };
        assert!(outcome.message().contains("55%"));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = IdentOutcome::NotFound {
            label: "novat".to_string(),
            confidence: 0.9,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "not_found");
        assert_eq!(json["label"], "novat");
    }
}
