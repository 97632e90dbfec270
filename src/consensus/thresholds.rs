//! Tier thresholds

use serde::{Deserialize, Serialize};

use super::errors::{ConsensusError, ConsensusOpResult};

fn default_engine_fraction() -> f64 {
    0.75
}

fn default_position_fraction() -> f64 {
    0.90
}

/// A result is `majority` when at least `majority_position_fraction` of
/// positions have at least `majority_engine_fraction` of engines agreeing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusThresholds {
    #[serde(default = "default_engine_fraction")]
    pub majority_engine_fraction: f64,
    #[serde(default = "default_position_fraction")]
    pub majority_position_fraction: f64,
}

impl Default for ConsensusThresholds {
    fn default() -> Self {
        Self {
            majority_engine_fraction: default_engine_fraction(),
            majority_position_fraction: default_position_fraction(),
        }
    }
}

impl ConsensusThresholds {
    pub fn validate(&self) -> ConsensusOpResult<()> {
        check("majority_engine_fraction", self.majority_engine_fraction)?;
        check("majority_position_fraction", self.majority_position_fraction)
    }

    /// `count / total >= majority_engine_fraction`
    pub fn engines_agree(&self, count: usize, total: usize) -> bool {
        meets(count, total, self.majority_engine_fraction)
    }

    /// `count / total >= majority_position_fraction`
    pub fn positions_agree(&self, count: usize, total: usize) -> bool {
        meets(count, total, self.majority_position_fraction)
    }
}

fn check(name: &'static str, value: f64) -> ConsensusOpResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConsensusError::InvalidThreshold {
            name,
            value: value.to_string(),
        })
    }
}

// Tolerates float error so that 3/4 meets 0.75 and 9/10 meets 0.9.
fn meets(count: usize, total: usize, fraction: f64) -> bool {
    if total == 0 {
        return false;
    }
    count as f64 + 1e-9 >= fraction * total as f64
}
