//! Mutability rules and the review-status order

use std::fmt;

use serde::{Deserialize, Serialize};

/// Write contract attached to one field layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutabilityRule {
    /// Set once while empty, never replaced afterwards
    Immutable,
    /// Set once while empty, replaced only with an explicit force flag
    WriteOnce,
    /// Replaced whenever the proposed value differs
    Iterable,
    /// Replaced only by a value of equal or higher review rank
    MonotonicStatus,
}

impl MutabilityRule {
    /// Returns the string representation used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            MutabilityRule::Immutable => "immutable",
            MutabilityRule::WriteOnce => "write-once",
            MutabilityRule::Iterable => "iterable",
            MutabilityRule::MonotonicStatus => "monotonic-status",
        }
    }
}

impl fmt::Display for MutabilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Totally ordered review status: `unreviewed < reviewed < approved`.
///
/// Values outside this set have no rank; see [`ReviewRank::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewRank {
    Unreviewed = 0,
    Reviewed = 1,
    Approved = 2,
}

impl ReviewRank {
    /// Parse a stored or proposed status value.
    ///
    /// Matching is exact, including case and whitespace, so a ranked value
    /// is always stored verbatim. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unreviewed" => Some(ReviewRank::Unreviewed),
            "reviewed" => Some(ReviewRank::Reviewed),
            "approved" => Some(ReviewRank::Approved),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewRank::Unreviewed => "unreviewed",
            ReviewRank::Reviewed => "reviewed",
            ReviewRank::Approved => "approved",
        }
    }
}

impl fmt::Display for ReviewRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the policy table: a host field and the rule guarding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    /// Host-side field identifier
    pub field_id: String,
    /// Layer name, usable as an alias for the field id
    pub layer: String,
    /// Write contract
    pub rule: MutabilityRule,
    /// Long-form text layer (status output reports length, not the value)
    #[serde(default)]
    pub content: bool,
}

impl FieldPolicy {
    /// Policy for a long-form text layer
    pub fn content(field_id: &str, layer: &str, rule: MutabilityRule) -> Self {
        Self {
            field_id: field_id.to_string(),
            layer: layer.to_string(),
            rule,
            content: true,
        }
    }

    /// Policy for a short metadata layer
    pub fn metadata(field_id: &str, layer: &str, rule: MutabilityRule) -> Self {
        Self {
            field_id: field_id.to_string(),
            layer: layer.to_string(),
            rule,
            content: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_rank_ordering() {
        assert!(ReviewRank::Unreviewed < ReviewRank::Reviewed);
        assert!(ReviewRank::Reviewed < ReviewRank::Approved);
    }

    #[test]
    fn test_review_rank_parse() {
        assert_eq!(ReviewRank::parse("approved"), Some(ReviewRank::Approved));
        assert_eq!(ReviewRank::parse(" reviewed\n"), None);
        assert_eq!(ReviewRank::parse("Approved"), None);
        assert_eq!(ReviewRank::parse("pending"), None);
        assert_eq!(ReviewRank::parse(""), None);
    }

    #[test]
    fn test_rule_serde_names() {
        let json = serde_json::to_string(&MutabilityRule::MonotonicStatus).unwrap();
        assert_eq!(json, "\"monotonic-status\"");

        let rule: MutabilityRule = serde_json::from_str("\"write-once\"").unwrap();
        assert_eq!(rule, MutabilityRule::WriteOnce);
        assert_eq!(rule.to_string(), "write-once");
    }

    #[test]
    fn test_field_policy_content_defaults_false() {
        let policy: FieldPolicy = serde_json::from_str(
            r#"{"field_id": "92", "layer": "ocr_status", "rule": "iterable"}"#,
        )
        .unwrap();
        assert!(!policy.content);
    }
}
