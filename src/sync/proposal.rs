//! Field proposals
//!
//! A proposal set maps field keys (field ids or layer names) to proposed
//! values. Entries that could not be parsed are kept alongside as
//! rejections so they are reported per field instead of failing the call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{SyncError, SyncOpResult};

/// A proposed new value for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub value: String,
    /// Overrides the write-once rule; ignored by every other rule
    #[serde(default)]
    pub force: bool,
}

impl Proposal {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            force: false,
        }
    }

    pub fn forced(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            force: true,
        }
    }

    /// Blank proposals mean "no value supplied".
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Proposals for one resource, keyed by field id or layer name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalSet {
    entries: BTreeMap<String, Proposal>,
    rejected: BTreeMap<String, String>,
}

impl ProposalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the proposal for `key`.
    pub fn insert(&mut self, key: impl Into<String>, proposal: Proposal) -> &mut Self {
        let key = key.into();
        self.rejected.remove(&key);
        self.entries.insert(key, proposal);
        self
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, proposal: Proposal) -> Self {
        self.insert(key, proposal);
        self
    }

    /// Record a malformed entry to be reported as invalid input.
    pub fn reject(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        let key = key.into();
        self.entries.remove(&key);
        self.rejected.insert(key, reason.into());
    }

    pub fn get(&self, key: &str) -> Option<&Proposal> {
        self.entries.get(key)
    }

    /// Valid proposals in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Proposal)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Malformed entries in key order
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rejected.iter().map(|(k, r)| (k.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.rejected.is_empty()
    }

    /// Parse the `proposals` object of a proposal document.
    ///
    /// Each entry is either a string (`"88": "text"`) or an object
    /// (`"89": {"value": "text", "force": true}`). Anything else is
    /// recorded as a per-field rejection. A non-object top level is a
    /// component-level error.
    pub fn from_json(value: &Value) -> SyncOpResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| SyncError::invalid_input("proposals must be a JSON object"))?;

        let mut set = Self::new();
        for (key, entry) in map {
            match parse_entry(entry) {
                Ok(proposal) => {
                    set.insert(key.clone(), proposal);
                }
                Err(reason) => set.reject(key.clone(), reason),
            }
        }
        Ok(set)
    }
}

fn parse_entry(entry: &Value) -> Result<Proposal, String> {
    match entry {
        Value::String(s) => Ok(Proposal::new(s.clone())),
        Value::Object(obj) => {
            let value = match obj.get("value") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => return Err(format!("value must be a string, got {}", kind(other))),
                None => return Err("missing \"value\"".to_string()),
            };
            let force = match obj.get("force") {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => *b,
                Some(other) => return Err(format!("force must be a boolean, got {}", kind(other))),
            };
            Ok(Proposal { value, force })
        }
        other => Err(format!("proposal must be a string or object, got {}", kind(other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FromIterator<(String, Proposal)> for ProposalSet {
    fn from_iter<I: IntoIterator<Item = (String, Proposal)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, proposal) in iter {
            set.insert(key, proposal);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_detection() {
        assert!(Proposal::new("").is_blank());
        assert!(Proposal::new("  \n").is_blank());
        assert!(!Proposal::new("a").is_blank());
    }

    #[test]
    fn test_from_json_accepts_both_forms() {
        let set = ProposalSet::from_json(&json!({
            "raw": "abc",
            "literal": {"value": "A", "force": true},
            "formatted": {"value": "F"}
        }))
        .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.get("raw"), Some(&Proposal::new("abc")));
        assert_eq!(set.get("literal"), Some(&Proposal::forced("A")));
        assert_eq!(set.get("formatted"), Some(&Proposal::new("F")));
        assert_eq!(set.rejected().count(), 0);
    }

    #[test]
    fn test_from_json_rejects_non_string_values() {
        let set = ProposalSet::from_json(&json!({
            "raw": 42,
            "literal": {"value": ["x"]},
            "formatted": {"value": "ok", "force": "yes"},
            "translation": {}
        }))
        .unwrap();

        assert_eq!(set.len(), 0);
        let rejected: Vec<_> = set.rejected().map(|(k, _)| k).collect();
        assert_eq!(rejected, vec!["formatted", "literal", "raw", "translation"]);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_from_json_requires_object() {
        let err = ProposalSet::from_json(&json!(["raw", "abc"])).unwrap_err();
        assert_eq!(err.code(), "PALIMPSEST_SYNC_INVALID_INPUT");
    }

    #[test]
    fn test_insert_clears_rejection() {
        let mut set = ProposalSet::new();
        set.reject("raw", "bad");
        set.insert("raw", Proposal::new("good"));
        assert_eq!(set.rejected().count(), 0);
        assert_eq!(set.len(), 1);
    }
}
