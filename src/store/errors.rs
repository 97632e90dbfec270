//! # Field Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a [`FieldStore`](super::FieldStore) implementation.
///
/// The synchronizer treats every variant as a per-field failure; none of
/// them abort sibling fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Invalid resource id: {0:?}")]
    InvalidResource(String),

    #[error("I/O error on resource {resource}: {message}")]
    Io { resource: String, message: String },

    #[error("Corrupt record for resource {resource}: {message}")]
    Corrupt { resource: String, message: String },

    #[error("Write rejected for field {field}: {message}")]
    WriteRejected { field: String, message: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn io(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn corrupt(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn write_rejected(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteRejected {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidResource(_) => "PALIMPSEST_STORE_INVALID_RESOURCE",
            StoreError::Io { .. } => "PALIMPSEST_STORE_IO",
            StoreError::Corrupt { .. } => "PALIMPSEST_STORE_CORRUPT",
            StoreError::WriteRejected { .. } => "PALIMPSEST_STORE_WRITE_REJECTED",
            StoreError::Unavailable(_) => "PALIMPSEST_STORE_UNAVAILABLE",
        }
    }
}
