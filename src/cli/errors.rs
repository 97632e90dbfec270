//! CLI-specific error types
//!
//! A `CliError` aborts the command: the process exits with status 1.
//! Per-field and per-page failures are not `CliError`s; they end the command
//! with "completed with errors" instead.

use std::fmt;
use std::io;

use crate::consensus::ConsensusError;
use crate::policy::PolicyError;
use crate::store::StoreError;
use crate::sync::SyncError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdin/stdout)
    IoError,
    /// Malformed arguments or proposal document
    InvalidInput,
    /// Store unusable for the whole command
    StoreFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "PALIMPSEST_CLI_CONFIG_ERROR",
            Self::IoError => "PALIMPSEST_CLI_IO_ERROR",
            Self::InvalidInput => "PALIMPSEST_CLI_INVALID_INPUT",
            Self::StoreFailed => "PALIMPSEST_CLI_STORE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Invalid input
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_input(format!("JSON error: {}", e))
    }
}

impl From<PolicyError> for CliError {
    fn from(e: PolicyError) -> Self {
        Self::config_error(format!("{} ({})", e, e.code()))
    }
}

impl From<ConsensusError> for CliError {
    fn from(e: ConsensusError) -> Self {
        let code = match e {
            ConsensusError::InsufficientReadings | ConsensusError::InvalidReading(_) => {
                CliErrorCode::InvalidInput
            }
            ConsensusError::InvalidPriority(_)
            | ConsensusError::DuplicateEngine(_)
            | ConsensusError::InvalidThreshold { .. } => CliErrorCode::ConfigError,
        };
        Self::new(code, format!("{} ({})", e, e.code()))
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Storage(inner) => inner.into(),
            other => Self::invalid_input(format!("{} ({})", other, other.code())),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::StoreFailed, format!("{} ({})", e, e.code()))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
