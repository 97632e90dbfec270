//! # OCR Consensus
//!
//! Merges independent OCR engine readings of one page into a single text.
//!
//! 1. Readings with an error or no text are excluded (they still count
//!    towards the expected engine total)
//! 2. Remaining readings are split into whitespace-delimited segments
//! 3. Segments are aligned by position
//! 4. Each position is decided by vote, then by [`EnginePriority`]
//! 5. Winners are joined with their original separators
//!
//! The result carries a [`ConsensusTier`] and one [`DisagreementSpan`] per
//! position where the engines did not all read the same thing.

mod align;
mod errors;
mod priority;
mod reading;
mod report;
mod resolver;
mod segment;
mod thresholds;

pub use align::{align, AlignedPosition};
pub use errors::{ConsensusError, ConsensusOpResult};
pub use priority::EnginePriority;
pub use reading::EngineReading;
pub use report::{digest, ConsensusReport, EngineStatus};
pub use resolver::{
    ConfidenceCounts, ConsensusResolver, ConsensusResult, ConsensusTier, DisagreementSpan,
    ExcludedEngine, PositionConfidence, SpanReading,
};
pub use segment::{segments, Segment};
pub use thresholds::ConsensusThresholds;
