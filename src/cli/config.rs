//! Configuration file
//!
//! ```json
//! {
//!   "store_dir": "./archive",
//!   "audit_log": "./archive/audit.log",
//!   "policy": "policy.json",
//!   "engine_priority": [["docai", "vision"], ["claude", "gpt"]],
//!   "thresholds": {"majority_engine_fraction": 0.75, "majority_position_fraction": 0.9},
//!   "fold_case": false,
//!   "engines_expected": 4
//! }
//! ```
//!
//! Every key is optional. `policy` is either a path to a policy document,
//! an inline document, or a bare list of field entries.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consensus::{ConsensusResolver, ConsensusThresholds, EnginePriority};
use crate::policy::{FieldPolicy, PolicyDocument, PolicyTable};

use super::errors::{CliError, CliResult};

/// Where the field policy table comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicySource {
    Path(PathBuf),
    Document(PolicyDocument),
    Fields(Vec<FieldPolicy>),
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory of the JSON field store
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Append-only audit log; no audit trail when absent
    #[serde(default)]
    pub audit_log: Option<PathBuf>,

    /// Field policy table; archival default when absent
    #[serde(default)]
    pub policy: Option<PolicySource>,

    /// Engine ranks, highest first
    #[serde(default = "default_engine_priority")]
    pub engine_priority: Vec<Vec<String>>,

    #[serde(default)]
    pub thresholds: ConsensusThresholds,

    /// Compare OCR segments case-insensitively
    #[serde(default)]
    pub fold_case: bool,

    /// Engines expected to read each page
    #[serde(default = "default_engines_expected")]
    pub engines_expected: usize,
}

fn default_store_dir() -> String {
    "./archive".to_string()
}

fn default_engine_priority() -> Vec<Vec<String>> {
    EnginePriority::archival_default().ranks().to_vec()
}

fn default_engines_expected() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            audit_log: None,
            policy: None,
            engine_priority: default_engine_priority(),
            thresholds: ConsensusThresholds::default(),
            fold_case: false,
            engines_expected: default_engines_expected(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path`, or validated defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.store_dir.trim().is_empty() {
            return Err(CliError::config_error("store_dir must not be empty"));
        }

        if self.engines_expected == 0 {
            return Err(CliError::config_error("engines_expected must be > 0"));
        }

        self.thresholds
            .validate()
            .map_err(|e| CliError::config_error(e.to_string()))?;

        self.engine_priority()?;
        self.policy_table()?;

        Ok(())
    }

    /// Get store directory as Path
    pub fn store_path(&self) -> &Path {
        Path::new(&self.store_dir)
    }

    pub fn engine_priority(&self) -> CliResult<EnginePriority> {
        EnginePriority::new(self.engine_priority.clone())
            .map_err(|e| CliError::config_error(format!("engine_priority: {}", e)))
    }

    /// Build the configured policy table.
    pub fn policy_table(&self) -> CliResult<PolicyTable> {
        let table = match &self.policy {
            None => PolicyTable::archival_default(),
            Some(PolicySource::Path(path)) => PolicyTable::load(path)?,
            Some(PolicySource::Document(doc)) => PolicyTable::from_document(doc.clone())?,
            Some(PolicySource::Fields(fields)) => PolicyTable::new("1", fields.clone())?,
        };
        Ok(table)
    }

    /// Build a resolver from priority, thresholds and case folding.
    pub fn resolver(&self) -> CliResult<ConsensusResolver> {
        let resolver = ConsensusResolver::new(self.engine_priority()?, self.thresholds)
            .map_err(|e| CliError::config_error(e.to_string()))?;
        Ok(resolver.with_fold_case(self.fold_case))
    }
}
