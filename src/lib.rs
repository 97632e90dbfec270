//! palimpsest - layered archival transcriptions with OCR consensus
//!
//! Two cores:
//! - [`sync`]: writes text layers of a resource into a host store, guarded
//!   by a per-field mutability policy ([`policy`], [`store`])
//! - [`consensus`]: merges the readings of several OCR engines into one
//!   text with per-position confidence
//!
//! [`cli`] wires both to files and the command line; [`observability`]
//! provides structured logs and the audit trail.

pub mod cli;
pub mod consensus;
pub mod observability;
pub mod policy;
pub mod store;
pub mod sync;
