//! Observability subsystem
//!
//! This module provides:
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - An append-only audit trail of sync results
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on synchronization or consensus outcomes
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use palimpsest::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::SyncStart, &[("resource_id", "page-7")]);
//! ```

pub mod audit;
mod events;
mod logger;

pub use audit::{AuditAction, AuditLog, AuditOutcome, AuditRecord, FileAuditLog, MemoryAuditLog};
pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
