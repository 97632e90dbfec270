//! Sync error types
//!
//! Rule rejections are not errors: they surface as `skipped` change
//! records. The variants here are either component-level failures returned
//! from `sync` itself, or per-field failures accumulated in
//! `SyncResult::errors`.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for sync operations
pub type SyncOpResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Malformed request or proposal
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Proposal names a field absent from the policy table
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Storage port read or write failed
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SyncError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::InvalidInput(_) => "PALIMPSEST_SYNC_INVALID_INPUT",
            SyncError::UnknownField(_) => "PALIMPSEST_SYNC_UNKNOWN_FIELD",
            SyncError::Storage(e) => e.code(),
        }
    }
}
