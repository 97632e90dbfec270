//! Change records and the per-call sync result

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of one field proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// Written into a previously empty field
    Created,
    /// Replaced an existing value
    Updated,
    /// Rejected by the field's rule; always carries a reason
    Skipped,
    /// Proposed value equals the stored value
    Unchanged,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Updated => "updated",
            ChangeAction::Skipped => "skipped",
            ChangeAction::Unchanged => "unchanged",
        }
    }

    /// Whether this action writes to the store
    pub fn is_write(&self) -> bool {
        matches!(self, ChangeAction::Created | ChangeAction::Updated)
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of a single field decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub field_id: String,
    pub layer: String,
    pub action: ChangeAction,
    pub reason: Option<String>,
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.layer, self.field_id, self.action)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

/// Per-action totals of a sync result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub unchanged: usize,
}

/// Result of one `sync` call. Built by the synchronizer, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    resource_id: String,
    success: bool,
    changes: Vec<ChangeRecord>,
    errors: Vec<String>,
}

impl SyncResult {
    pub(crate) fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            success: true,
            changes: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn push_change(&mut self, change: ChangeRecord) {
        self.changes.push(change);
    }

    pub(crate) fn push_error(&mut self, error: String) {
        self.success = false;
        self.errors.push(error);
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// False when at least one field failed
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Change record for a field id
    pub fn change_for(&self, field_id: &str) -> Option<&ChangeRecord> {
        self.changes.iter().find(|c| c.field_id == field_id)
    }

    pub fn counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for change in &self.changes {
            match change.action {
                ChangeAction::Created => counts.created += 1,
                ChangeAction::Updated => counts.updated += 1,
                ChangeAction::Skipped => counts.skipped += 1,
                ChangeAction::Unchanged => counts.unchanged += 1,
            }
        }
        counts
    }

    /// True when any field was written
    pub fn wrote_anything(&self) -> bool {
        self.changes.iter().any(|c| c.action.is_write())
    }
}
