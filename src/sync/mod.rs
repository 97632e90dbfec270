//! # Field Synchronization
//!
//! Reconciles proposed layer values against what a resource already stores,
//! according to each field's mutability rule.
//!
//! Flow for a single proposal:
//!
//! 1. Resolve the key (field id or layer name) in the policy table
//! 2. Read the stored value through the [`FieldStore`](crate::store::FieldStore)
//! 3. [`decide`] created / updated / skipped / unchanged
//! 4. Write only for created / updated
//!
//! Rule rejections are reported as `skipped` with a reason. Failures of
//! individual fields are collected in [`SyncResult::errors`] and never stop
//! the remaining fields.

mod change;
mod decision;
mod errors;
mod proposal;
mod status;
mod synchronizer;

pub use change::{ChangeAction, ChangeCounts, ChangeRecord, SyncResult};
pub use decision::{decide, Decision};
pub use errors::{SyncError, SyncOpResult};
pub use proposal::{Proposal, ProposalSet};
pub use status::{FieldStatus, ResourceStatus};
pub use synchronizer::FieldSynchronizer;
