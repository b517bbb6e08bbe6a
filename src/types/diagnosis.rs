//! Diagnosis produced for one patient record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visual emphasis tier derived from a display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Normal,
    Medium,
    High,
}

impl SeverityTier {
    /// Classify a display label by substring, in English or Portuguese.
    ///
    /// Obesity is checked first so "Obesity" labels never fall into the
    /// overweight tier.
    pub fn from_display_label(label: &str) -> Self {
        if label.contains("Obesity") || label.contains("Obesidade") {
            SeverityTier::High
        } else if label.contains("Overweight") || label.contains("Sobrepeso") {
            SeverityTier::Medium
        } else {
            SeverityTier::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Normal => "normal",
            SeverityTier::Medium => "medium",
            SeverityTier::High => "high",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one record through the simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Unique diagnosis identifier
    pub diagnosis_id: String,

    /// Caller-supplied correlation id, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Class name emitted by the model
    pub raw_label: String,

    /// Label shown to the user
    pub display_label: String,

    /// Emphasis tier of the display label
    pub severity: SeverityTier,

    /// Generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl Diagnosis {
    /// Create a diagnosis; the severity tier is derived from `display_label`.
    pub fn new(raw_label: String, display_label: String) -> Self {
        let severity = SeverityTier::from_display_label(&display_label);
        Self {
            diagnosis_id: uuid::Uuid::new_v4().to_string(),
            request_id: None,
            raw_label,
            display_label,
            severity,
            timestamp: Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// The `(display_label, severity)` pair handed to the presentation layer.
    pub fn outcome(&self) -> (&str, SeverityTier) {
        (&self.display_label, self.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_display_label() {
        assert_eq!(SeverityTier::from_display_label("Underweight"), SeverityTier::Normal);
        assert_eq!(SeverityTier::from_display_label("Normal Weight"), SeverityTier::Normal);
        assert_eq!(
            SeverityTier::from_display_label("Overweight Level II"),
            SeverityTier::Medium
        );
        assert_eq!(SeverityTier::from_display_label("Obesity Grade I"), SeverityTier::High);
        assert_eq!(SeverityTier::from_display_label("Morbid Obesity"), SeverityTier::High);
    }

    #[test]
    fn test_severity_portuguese_labels() {
        assert_eq!(SeverityTier::from_display_label("Sobrepeso Nível I"), SeverityTier::Medium);
        assert_eq!(SeverityTier::from_display_label("Obesidade Mórbida"), SeverityTier::High);
        assert_eq!(SeverityTier::from_display_label("Peso Normal"), SeverityTier::Normal);
    }

    #[test]
    fn test_severity_untranslated_raw_label() {
        // Raw labels that slip through translation are still tiered by substring
        assert_eq!(SeverityTier::from_display_label("Obesity_Type_IV"), SeverityTier::High);
        assert_eq!(SeverityTier::from_display_label("obesity"), SeverityTier::Normal);
    }

    #[test]
    fn test_diagnosis_serialization() {
        let diagnosis = Diagnosis::new("Obesity_Type_II".to_string(), "Obesity Grade II".to_string())
            .with_request_id(Some("req-1".to_string()));

        let json = serde_json::to_value(&diagnosis).unwrap();
        assert_eq!(json["severity"], "high");
        assert_eq!(json["request_id"], "req-1");

        let back: Diagnosis = serde_json::from_value(json).unwrap();
        assert_eq!(back.outcome(), ("Obesity Grade II", SeverityTier::High));
    }
}
