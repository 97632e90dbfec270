//! Consensus error types
//!
//! Only component-level failures are errors. A failed or blank engine
//! reading is excluded from alignment and reported on the result instead.

use thiserror::Error;

/// Result type for consensus operations
pub type ConsensusOpResult<T> = Result<T, ConsensusError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// Resolver called with zero readings
    #[error("at least one engine reading is required")]
    InsufficientReadings,

    /// Reading without an engine id, or an engine id given twice
    #[error("invalid reading: {0}")]
    InvalidReading(String),

    /// Malformed engine priority configuration
    #[error("invalid engine priority: {0}")]
    InvalidPriority(String),

    /// Engine id listed in more than one priority rank
    #[error("engine '{0}' appears more than once in the priority order")]
    DuplicateEngine(String),

    /// Threshold outside (0, 1]
    #[error("threshold {name} must be in (0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: String },
}

impl ConsensusError {
    pub fn invalid_reading(msg: impl Into<String>) -> Self {
        Self::InvalidReading(msg.into())
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            ConsensusError::InsufficientReadings => "PALIMPSEST_CONSENSUS_INSUFFICIENT_READINGS",
            ConsensusError::InvalidReading(_) => "PALIMPSEST_CONSENSUS_INVALID_READING",
            ConsensusError::InvalidPriority(_) => "PALIMPSEST_CONSENSUS_INVALID_PRIORITY",
            ConsensusError::DuplicateEngine(_) => "PALIMPSEST_CONSENSUS_DUPLICATE_ENGINE",
            ConsensusError::InvalidThreshold { .. } => "PALIMPSEST_CONSENSUS_INVALID_THRESHOLD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            ConsensusError::InsufficientReadings.code(),
            "PALIMPSEST_CONSENSUS_INSUFFICIENT_READINGS"
        );
        let err = ConsensusError::InvalidThreshold {
            name: "majority_engine_fraction",
            value: "1.5".into(),
        };
        assert_eq!(err.code(), "PALIMPSEST_CONSENSUS_INVALID_THRESHOLD");
        assert!(err.to_string().contains("1.5"));
    }
}
