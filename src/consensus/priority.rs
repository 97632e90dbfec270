//! Engine priority
//!
//! Engines are grouped into ranks; rank 0 outranks rank 1 and so on.
//! Within a rank engines are equal for tie-breaking, but the listed order
//! still decides which engine's text is shown for an unresolved position.
//! Engines not listed share the lowest rank.

use std::collections::HashSet;

use super::errors::{ConsensusError, ConsensusOpResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePriority {
    ranks: Vec<Vec<String>>,
}

impl EnginePriority {
    /// Build from ranked groups. An engine may appear only once.
    pub fn new(ranks: Vec<Vec<String>>) -> ConsensusOpResult<Self> {
        let mut seen = HashSet::new();
        for engine in ranks.iter().flatten() {
            if engine.trim().is_empty() {
                return Err(ConsensusError::InvalidPriority(
                    "blank engine id in priority order".to_string(),
                ));
            }
            if !seen.insert(engine.as_str()) {
                return Err(ConsensusError::DuplicateEngine(engine.clone()));
            }
        }
        let ranks = ranks.into_iter().filter(|r| !r.is_empty()).collect();
        Ok(Self { ranks })
    }

    /// One engine per rank, highest first.
    pub fn ordered<I, S>(engines: I) -> ConsensusOpResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(engines.into_iter().map(|e| vec![e.into()]).collect())
    }

    /// Dedicated OCR engines first, then vision LLMs.
    pub fn archival_default() -> Self {
        Self {
            ranks: vec![
                vec!["docai".to_string(), "vision".to_string()],
                vec!["claude".to_string(), "gpt".to_string()],
            ],
        }
    }

    /// Rank of an engine; unlisted engines get `ranks().len()`.
    pub fn rank(&self, engine_id: &str) -> usize {
        self.ranks
            .iter()
            .position(|r| r.iter().any(|e| e == engine_id))
            .unwrap_or(self.ranks.len())
    }

    /// Position in the flattened order; unlisted engines sort last.
    pub fn order(&self, engine_id: &str) -> usize {
        self.ranks
            .iter()
            .flatten()
            .position(|e| e == engine_id)
            .unwrap_or(usize::MAX)
    }

    pub fn ranks(&self) -> &[Vec<String>] {
        &self.ranks
    }
}

impl Default for EnginePriority {
    fn default() -> Self {
        Self::archival_default()
    }
}
