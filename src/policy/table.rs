//! Field policy table
//!
//! The table is injected configuration: it is either the archival default
//! or loaded from a JSON document at startup. Once built it is read-only.
//!
//! Document format:
//!
//! ```json
//! {
//!   "version": "2",
//!   "fields": [
//!     {"field_id": "88", "layer": "raw", "rule": "immutable", "content": true}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{PolicyError, PolicyResult};
use super::types::{FieldPolicy, MutabilityRule};

/// Well-known layer names of the archival default table.
pub mod layers {
    pub const RAW: &str = "raw";
    pub const LITERAL: &str = "literal";
    pub const FORMATTED: &str = "formatted";
    pub const TRANSLATION: &str = "translation";
    pub const LITERAL_REVIEW_STATUS: &str = "literal_review_status";
    pub const FORMATTED_REVIEW_STATUS: &str = "formatted_review_status";
    pub const PROCESSING_VERSION: &str = "processing_version";
    pub const OCR_ENGINE: &str = "ocr_engine";
    pub const OCR_LANGUAGE: &str = "ocr_language";
    pub const OCR_STATUS: &str = "ocr_status";
    pub const TRANSCRIPTION_METHOD: &str = "transcription_method";
    pub const TRANSCRIPTION_NOTES: &str = "transcription_notes";
    pub const FORMATTING_METHOD: &str = "formatting_method";
    pub const FORMATTING_NOTES: &str = "formatting_notes";
    pub const TRANSLATION_LANGUAGE: &str = "translation_language";
}

/// Serialized form of a policy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default = "default_version")]
    pub version: String,
    pub fields: Vec<FieldPolicy>,
}

fn default_version() -> String {
    "1".to_string()
}

/// Read-only mapping from field ids (and layer aliases) to their policy.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    version: String,
    fields: Vec<FieldPolicy>,
    /// field id -> index into `fields`
    by_id: BTreeMap<String, usize>,
    /// layer name -> index into `fields`
    by_layer: BTreeMap<String, usize>,
}

impl PolicyTable {
    /// Builds a table, rejecting blank identifiers and duplicates.
    ///
    /// A layer name may not shadow another entry's field id, so a lookup
    /// key always resolves to at most one field.
    pub fn new(version: impl Into<String>, fields: Vec<FieldPolicy>) -> PolicyResult<Self> {
        let mut by_id = BTreeMap::new();
        let mut by_layer = BTreeMap::new();

        for (idx, policy) in fields.iter().enumerate() {
            if policy.field_id.trim().is_empty() {
                return Err(PolicyError::EmptyIdentifier(format!("<entry {}>", idx)));
            }
            if policy.layer.trim().is_empty() {
                return Err(PolicyError::EmptyIdentifier(policy.field_id.clone()));
            }
            if by_id.insert(policy.field_id.clone(), idx).is_some() {
                return Err(PolicyError::DuplicateField(policy.field_id.clone()));
            }
            if by_layer.insert(policy.layer.clone(), idx).is_some() {
                return Err(PolicyError::DuplicateLayer(policy.layer.clone()));
            }
        }

        for (layer, idx) in &by_layer {
            if let Some(other) = by_id.get(layer) {
                if other != idx {
                    return Err(PolicyError::DuplicateLayer(layer.clone()));
                }
            }
        }

        Ok(Self {
            version: version.into(),
            fields,
            by_id,
            by_layer,
        })
    }

    /// The archival layer table used when no table is configured.
    pub fn archival_default() -> Self {
        use MutabilityRule::*;

        let fields = vec![
            FieldPolicy::content("88", layers::RAW, Immutable),
            FieldPolicy::content("89", layers::LITERAL, WriteOnce),
            FieldPolicy::content("96", layers::FORMATTED, Iterable),
            FieldPolicy::content("101", layers::TRANSLATION, Iterable),
            FieldPolicy::metadata("94", layers::LITERAL_REVIEW_STATUS, MonotonicStatus),
            FieldPolicy::metadata("98", layers::FORMATTED_REVIEW_STATUS, MonotonicStatus),
            FieldPolicy::metadata("100", layers::PROCESSING_VERSION, Iterable),
            FieldPolicy::metadata("90", layers::OCR_ENGINE, WriteOnce),
            FieldPolicy::metadata("91", layers::OCR_LANGUAGE, WriteOnce),
            FieldPolicy::metadata("92", layers::OCR_STATUS, Iterable),
            FieldPolicy::metadata("93", layers::TRANSCRIPTION_METHOD, Iterable),
            FieldPolicy::metadata("95", layers::TRANSCRIPTION_NOTES, Iterable),
            FieldPolicy::metadata("97", layers::FORMATTING_METHOD, Iterable),
            FieldPolicy::metadata("99", layers::FORMATTING_NOTES, Iterable),
            FieldPolicy::metadata("102", layers::TRANSLATION_LANGUAGE, Iterable),
        ];

        match Self::new("archival-1", fields) {
            Ok(table) => table,
            // The literal table above has unique, non-blank identifiers.
            Err(e) => unreachable!("archival default table is invalid: {}", e),
        }
    }

    /// Builds a table from its serialized form.
    pub fn from_document(doc: PolicyDocument) -> PolicyResult<Self> {
        Self::new(doc.version, doc.fields)
    }

    /// Loads a table from a JSON file.
    pub fn load(path: &Path) -> PolicyResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PolicyError::malformed(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let doc: PolicyDocument = serde_json::from_str(&content).map_err(|e| {
            PolicyError::malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        Self::from_document(doc)
    }

    /// Serialized form of this table.
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            version: self.version.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Looks up a field by its exact field id.
    pub fn get(&self, field_id: &str) -> Option<&FieldPolicy> {
        self.by_id.get(field_id).map(|&idx| &self.fields[idx])
    }

    /// Looks up a field by field id, falling back to its layer name.
    pub fn resolve(&self, key: &str) -> Option<&FieldPolicy> {
        self.get(key)
            .or_else(|| self.by_layer.get(key).map(|&idx| &self.fields[idx]))
    }

    /// Rule for a field id or layer name.
    pub fn rule_for(&self, key: &str) -> Option<MutabilityRule> {
        self.resolve(key).map(|p| p.rule)
    }

    /// Table version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FieldPolicy> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::archival_default()
    }
}
