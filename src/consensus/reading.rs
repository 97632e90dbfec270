//! Engine readings

use serde::{Deserialize, Serialize};

/// Text one OCR engine produced for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReading {
    pub engine_id: String,
    #[serde(default)]
    pub text: String,
    /// Engine-reported confidence, when the engine provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Set when the engine call failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EngineReading {
    pub fn new(engine_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            engine_id: engine_id.into(),
            text: text.into(),
            confidence: None,
            error: None,
        }
    }

    /// A reading for an engine call that failed.
    pub fn failed(engine_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            engine_id: engine_id.into(),
            text: String::new(),
            confidence: None,
            error: Some(error.into()),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Why this reading takes no part in alignment, if it doesn't.
    pub fn exclusion_reason(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(format!("engine error: {}", error));
        }
        if self.text.trim().is_empty() {
            return Some("empty reading".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion() {
        assert_eq!(EngineReading::new("docai", "Lieber").exclusion_reason(), None);
        assert_eq!(
            EngineReading::new("docai", " \n").exclusion_reason().as_deref(),
            Some("empty reading")
        );
        let failed = EngineReading::failed("gpt", "timeout");
        assert!(!failed.succeeded());
        assert_eq!(failed.exclusion_reason().as_deref(), Some("engine error: timeout"));
    }

    #[test]
    fn test_deserialize_minimal() {
        let r: EngineReading = serde_json::from_str(r#"{"engine_id": "vision"}"#).unwrap();
        assert_eq!(r.text, "");
        assert!(r.succeeded());
    }
}
