//! Policy table error types
//!
//! Error codes:
//! - PALIMPSEST_POLICY_MALFORMED
//! - PALIMPSEST_POLICY_DUPLICATE_FIELD
//! - PALIMPSEST_POLICY_DUPLICATE_LAYER
//! - PALIMPSEST_POLICY_EMPTY_IDENTIFIER
//!
//! All policy errors are raised while the table is loaded, before any
//! resource is touched.

use thiserror::Error;

/// Result type for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised while building or loading a policy table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Table file unreadable or not valid JSON
    #[error("malformed policy table at {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// Same field id declared twice
    #[error("duplicate field id: {0}")]
    DuplicateField(String),

    /// Same layer name declared twice, or a layer name shadowing a field id
    #[error("duplicate layer name: {0}")]
    DuplicateLayer(String),

    /// Field id or layer name is blank
    #[error("empty identifier in policy entry: {0}")]
    EmptyIdentifier(String),
}

impl PolicyError {
    /// Create a malformed-table error
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "PALIMPSEST_POLICY_MALFORMED",
            Self::DuplicateField(_) => "PALIMPSEST_POLICY_DUPLICATE_FIELD",
            Self::DuplicateLayer(_) => "PALIMPSEST_POLICY_DUPLICATE_LAYER",
            Self::EmptyIdentifier(_) => "PALIMPSEST_POLICY_EMPTY_IDENTIFIER",
        }
    }
}
