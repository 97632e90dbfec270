//! Observable events
//!
//! Events are explicit and typed. Each maps to one stable log event name.

use std::fmt;

use super::logger::Severity;

/// Observable events in palimpsest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Policy table loaded
    PolicyLoaded,

    // Synchronization
    /// Sync of one resource begins
    SyncStart,
    /// A field value was written (created or updated)
    FieldApplied,
    /// A field proposal was rejected by its rule
    FieldSkipped,
    /// A field already held the proposed value
    FieldUnchanged,
    /// A field failed (invalid input or storage error)
    FieldFailed,
    /// Sync of one resource finished
    SyncComplete,

    // Consensus
    /// Consensus resolution begins
    ConsensusStart,
    /// An engine reading was excluded from alignment
    EngineExcluded,
    /// A position could not be resolved by vote or priority
    PositionUnresolved,
    /// Consensus resolution finished
    ConsensusComplete,
    /// Consensus produced no agreement at all
    ConsensusUnverified,

    // Reports
    /// A report or output file was written
    ReportWritten,
    /// A page in a batch failed
    BatchPageFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::PolicyLoaded => "POLICY_LOADED",

            Event::SyncStart => "SYNC_BEGIN",
            Event::FieldApplied => "FIELD_APPLIED",
            Event::FieldSkipped => "FIELD_SKIPPED",
            Event::FieldUnchanged => "FIELD_UNCHANGED",
            Event::FieldFailed => "FIELD_FAILED",
            Event::SyncComplete => "SYNC_COMPLETE",

            Event::ConsensusStart => "CONSENSUS_BEGIN",
            Event::EngineExcluded => "ENGINE_EXCLUDED",
            Event::PositionUnresolved => "POSITION_UNRESOLVED",
            Event::ConsensusComplete => "CONSENSUS_COMPLETE",
            Event::ConsensusUnverified => "CONSENSUS_UNVERIFIED",

            Event::ReportWritten => "REPORT_WRITTEN",
            Event::BatchPageFailed => "BATCH_PAGE_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::FieldUnchanged | Event::PositionUnresolved => Severity::Trace,
            Event::EngineExcluded | Event::ConsensusUnverified | Event::FieldSkipped => {
                Severity::Warn
            }
            Event::FieldFailed | Event::BatchPageFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 15] = [
        Event::ConfigLoaded,
        Event::PolicyLoaded,
        Event::SyncStart,
        Event::FieldApplied,
        Event::FieldSkipped,
        Event::FieldUnchanged,
        Event::FieldFailed,
        Event::SyncComplete,
        Event::ConsensusStart,
        Event::EngineExcluded,
        Event::PositionUnresolved,
        Event::ConsensusComplete,
        Event::ConsensusUnverified,
        Event::ReportWritten,
        Event::BatchPageFailed,
    ];

    #[test]
    fn test_all_events_have_string_representation() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_names_unique() {
        let mut names: Vec<_> = ALL.iter().map(|e| e.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_failure_events_are_errors() {
        assert_eq!(Event::FieldFailed.severity(), Severity::Error);
        assert_eq!(Event::FieldSkipped.severity(), Severity::Warn);
        assert_eq!(Event::SyncComplete.severity(), Severity::Info);
    }
}
