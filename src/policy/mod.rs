//! Mutability policy for archival field layers
//!
//! Each field layer carries exactly one rule:
//!
//! - `immutable`: written once while empty, never replaced
//! - `write-once`: written once while empty, replaced only when forced
//! - `iterable`: replaced whenever the content differs
//! - `monotonic-status`: review status that can only move up
//!
//! The table mapping field ids to rules is configuration, not code.

mod errors;
mod table;
mod types;

pub use errors::{PolicyError, PolicyResult};
pub use table::{layers, PolicyDocument, PolicyTable};
pub use types::{FieldPolicy, MutabilityRule, ReviewRank};
