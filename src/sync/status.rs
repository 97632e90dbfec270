//! Read-only view of a resource's layers

use serde::Serialize;

use crate::policy::{FieldPolicy, MutabilityRule};

use super::errors::SyncError;

/// State of one configured field.
///
/// Content layers only report their length; metadata fields carry the
/// stored value itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldStatus {
    pub field_id: String,
    pub layer: String,
    pub rule: MutabilityRule,
    pub populated: bool,
    pub chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldStatus {
    pub(crate) fn from_value(policy: &FieldPolicy, value: Option<String>) -> Self {
        let populated = value.as_deref().map_or(false, |v| !v.trim().is_empty());
        let chars = value.as_deref().map_or(0, |v| v.chars().count());
        Self {
            field_id: policy.field_id.clone(),
            layer: policy.layer.clone(),
            rule: policy.rule,
            populated,
            chars,
            value: if policy.content { None } else { value },
            error: None,
        }
    }

    pub(crate) fn from_error(policy: &FieldPolicy, err: &SyncError) -> Self {
        Self {
            field_id: policy.field_id.clone(),
            layer: policy.layer.clone(),
            rule: policy.rule,
            populated: false,
            chars: 0,
            value: None,
            error: Some(err.to_string()),
        }
    }
}

/// Every configured field of one resource, in policy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    pub resource_id: String,
    pub policy_version: String,
    pub fields: Vec<FieldStatus>,
}

impl ResourceStatus {
    /// Field by id or layer name
    pub fn field(&self, key: &str) -> Option<&FieldStatus> {
        self.fields
            .iter()
            .find(|f| f.field_id == key)
            .or_else(|| self.fields.iter().find(|f| f.layer == key))
    }

    /// Number of fields holding a non-blank value
    pub fn populated_count(&self) -> usize {
        self.fields.iter().filter(|f| f.populated).count()
    }

    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|f| f.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_value_hidden() {
        let policy = FieldPolicy::content("88", "raw", MutabilityRule::Immutable);
        let status = FieldStatus::from_value(&policy, Some("Grüße".to_string()));
        assert!(status.populated);
        assert_eq!(status.chars, 5);
        assert_eq!(status.value, None);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["rule"], "immutable");
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_blank_value_not_populated() {
        let policy = FieldPolicy::metadata("94", "status", MutabilityRule::MonotonicStatus);
        let status = FieldStatus::from_value(&policy, Some("  ".to_string()));
        assert!(!status.populated);
        assert_eq!(status.value.as_deref(), Some("  "));
    }
}
