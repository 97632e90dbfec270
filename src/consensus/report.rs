//! Machine-readable consensus report

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::reading::EngineReading;
use super::resolver::{ConsensusResult, ConsensusTier, DisagreementSpan, ExcludedEngine};

/// Status of one engine's reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub engine_id: String,
    pub success: bool,
    pub chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// SHA-256 of the reading text, lowercase hex
    pub digest: String,
}

impl EngineStatus {
    fn from_reading(reading: &EngineReading) -> Self {
        Self {
            engine_id: reading.engine_id.clone(),
            success: reading.succeeded(),
            chars: reading.text.chars().count(),
            confidence: reading.confidence,
            error: reading.error.clone(),
            digest: digest(&reading.text),
        }
    }
}

/// SHA-256 of a text, lowercase hex.
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Full report of one resolution, written next to the consensus text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusReport {
    pub source: String,
    pub tier: ConsensusTier,
    pub consensus_text: String,
    pub agreement_count: usize,
    pub total_engines: usize,
    pub overall_confidence: f64,
    pub total_positions: usize,
    pub high_confidence_positions: usize,
    pub medium_confidence_positions: usize,
    pub low_confidence_positions: usize,
    pub unresolved_positions: usize,
    pub engines: Vec<EngineStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedEngine>,
    pub disagreements: Vec<DisagreementSpan>,
}

impl ConsensusReport {
    pub fn new(source: impl Into<String>, readings: &[EngineReading], result: &ConsensusResult) -> Self {
        Self {
            source: source.into(),
            tier: result.tier,
            consensus_text: result.text.clone(),
            agreement_count: result.agreement_count,
            total_engines: result.total_engines,
            overall_confidence: result.overall_confidence(),
            total_positions: result.positions,
            high_confidence_positions: result.confidence.high,
            medium_confidence_positions: result.confidence.medium,
            low_confidence_positions: result.confidence.low,
            unresolved_positions: result.unresolved_positions,
            engines: readings.iter().map(EngineStatus::from_reading).collect(),
            excluded: result.excluded.clone(),
            disagreements: result.disagreements.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        fs::write(path, body)
    }
}
