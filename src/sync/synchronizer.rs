//! Field synchronizer
//!
//! Applies the policy table to a set of proposals for one resource.
//!
//! Guarantees:
//! - Each field is read, decided and written independently
//! - No write happens for `skipped` or `unchanged` decisions
//! - A failing field is reported in `errors` and never blocks its siblings
//! - Re-running identical proposals reports only `unchanged`/`skipped`

use std::collections::BTreeSet;

use crate::observability::{log_event_with_fields, Event};
use crate::policy::{FieldPolicy, PolicyTable};
use crate::store::FieldStore;

use super::change::{ChangeAction, ChangeRecord, SyncResult};
use super::decision::decide;
use super::errors::{SyncError, SyncOpResult};
use super::proposal::{Proposal, ProposalSet};
use super::status::{FieldStatus, ResourceStatus};

/// Synchronizes proposed layer values into a field store.
#[derive(Debug)]
pub struct FieldSynchronizer<S: FieldStore> {
    store: S,
    policy: PolicyTable,
}

impl<S: FieldStore> FieldSynchronizer<S> {
    pub fn new(store: S, policy: PolicyTable) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `proposals` to `resource_id`.
    ///
    /// Returns `Err` only for component-level problems (blank resource id).
    /// Everything per-field lands in the returned [`SyncResult`].
    pub fn sync(&self, resource_id: &str, proposals: &ProposalSet) -> SyncOpResult<SyncResult> {
        validate_resource_id(resource_id)?;

        let count = proposals.len().to_string();
        log_event_with_fields(
            Event::SyncStart,
            &[("resource_id", resource_id), ("proposals", count.as_str())],
        );

        let mut result = SyncResult::new(resource_id);

        for (key, reason) in proposals.rejected() {
            let err = SyncError::invalid_input(reason);
            self.record_error(&mut result, resource_id, key, &err);
        }

        let mut seen = BTreeSet::new();
        for (key, proposal) in proposals.iter() {
            let policy = match self.policy.resolve(key) {
                Some(policy) => policy,
                None => {
                    let err = SyncError::UnknownField(key.to_string());
                    self.record_error(&mut result, resource_id, key, &err);
                    continue;
                }
            };

            if !seen.insert(policy.field_id.as_str()) {
                let err = SyncError::invalid_input(format!(
                    "field {} ({}) proposed more than once",
                    policy.field_id, policy.layer
                ));
                self.record_error(&mut result, resource_id, key, &err);
                continue;
            }

            match self.sync_field(resource_id, policy, proposal) {
                Ok(change) => {
                    log_change(resource_id, &change);
                    result.push_change(change);
                }
                Err(err) => self.record_error(&mut result, resource_id, &policy.field_id, &err),
            }
        }

        let counts = result.counts();
        let created = counts.created.to_string();
        let updated = counts.updated.to_string();
        let skipped = counts.skipped.to_string();
        let unchanged = counts.unchanged.to_string();
        let errors = result.errors().len().to_string();
        log_event_with_fields(
            Event::SyncComplete,
            &[
                ("resource_id", resource_id),
                ("success", if result.success() { "true" } else { "false" }),
                ("created", created.as_str()),
                ("updated", updated.as_str()),
                ("skipped", skipped.as_str()),
                ("unchanged", unchanged.as_str()),
                ("errors", errors.as_str()),
            ],
        );

        Ok(result)
    }

    /// Read, decide and (maybe) write one field.
    fn sync_field(
        &self,
        resource_id: &str,
        policy: &FieldPolicy,
        proposal: &Proposal,
    ) -> SyncOpResult<ChangeRecord> {
        let current = self.store.get(resource_id, &policy.field_id)?;
        let decision = decide(policy.rule, current.as_deref(), proposal);

        if decision.writes() {
            self.store.set(resource_id, &policy.field_id, &proposal.value)?;
        }

        Ok(ChangeRecord {
            field_id: policy.field_id.clone(),
            layer: policy.layer.clone(),
            action: decision.action,
            reason: decision.reason,
        })
    }

    fn record_error(&self, result: &mut SyncResult, resource_id: &str, key: &str, err: &SyncError) {
        let detail = err.to_string();
        log_event_with_fields(
            Event::FieldFailed,
            &[
                ("resource_id", resource_id),
                ("field", key),
                ("code", err.code()),
                ("error", detail.as_str()),
            ],
        );
        let message = format!("field {}: {}", key, detail);
        result.push_error(message);
    }

    /// Current state of every configured field of a resource.
    pub fn status(&self, resource_id: &str) -> SyncOpResult<ResourceStatus> {
        validate_resource_id(resource_id)?;

        let fields = self
            .policy
            .iter()
            .map(|policy| match self.store.get(resource_id, &policy.field_id) {
                Ok(value) => FieldStatus::from_value(policy, value),
                Err(e) => FieldStatus::from_error(policy, &SyncError::from(e)),
            })
            .collect();

        Ok(ResourceStatus {
            resource_id: resource_id.to_string(),
            policy_version: self.policy.version().to_string(),
            fields,
        })
    }
}

fn validate_resource_id(resource_id: &str) -> SyncOpResult<()> {
    if resource_id.trim().is_empty() {
        return Err(SyncError::invalid_input("resource id must not be empty"));
    }
    Ok(())
}

fn log_change(resource_id: &str, change: &ChangeRecord) {
    let event = match change.action {
        ChangeAction::Created | ChangeAction::Updated => Event::FieldApplied,
        ChangeAction::Skipped => Event::FieldSkipped,
        ChangeAction::Unchanged => Event::FieldUnchanged,
    };
    let mut fields = vec![
        ("resource_id", resource_id),
        ("field", change.field_id.as_str()),
        ("layer", change.layer.as_str()),
        ("action", change.action.as_str()),
    ];
    if let Some(reason) = &change.reason {
        fields.push(("reason", reason.as_str()));
    }
    log_event_with_fields(event, &fields);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::layers;
    use crate::store::MemoryStore;

    fn synchronizer() -> FieldSynchronizer<MemoryStore> {
        FieldSynchronizer::new(MemoryStore::new(), PolicyTable::archival_default())
    }

    #[test]
    fn test_blank_resource_id_is_component_error() {
        let sync = synchronizer();
        let proposals = ProposalSet::new().with(layers::RAW, Proposal::new("x"));
        let err = sync.sync("  ", &proposals).unwrap_err();
        assert_eq!(err.code(), "PALIMPSEST_SYNC_INVALID_INPUT");
        assert_eq!(sync.store().write_count(), 0);
    }

    #[test]
    fn test_layer_alias_and_id_map_to_same_field() {
        let sync = synchronizer();
        let proposals = ProposalSet::new()
            .with(layers::RAW, Proposal::new("a"))
            .with("88", Proposal::new("b"));

        let result = sync.sync("r", &proposals).unwrap();
        assert!(!result.success());
        assert_eq!(result.changes().len(), 1);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(sync.store().write_count(), 1);
    }

    #[test]
    fn test_unknown_field_reported_without_io() {
        let sync = synchronizer();
        sync.store().fail_reads_for("nope");
        let proposals = ProposalSet::new()
            .with("nope", Proposal::new("x"))
            .with(layers::FORMATTED, Proposal::new("F"));

        let result = sync.sync("r", &proposals).unwrap();
        assert!(!result.success());
        assert!(result.errors()[0].contains("unknown field: nope"));
        assert_eq!(
            result.change_for("96").map(|c| c.action),
            Some(ChangeAction::Created)
        );
    }

    #[test]
    fn test_read_failure_isolated() {
        let sync = synchronizer();
        sync.store().fail_reads_for("89");
        let proposals = ProposalSet::new()
            .with(layers::LITERAL, Proposal::new("L"))
            .with(layers::FORMATTED, Proposal::new("F"));

        let result = sync.sync("r", &proposals).unwrap();
        assert!(!result.success());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].starts_with("field 89:"));
        assert!(result.change_for("89").is_none());
        assert_eq!(sync.store().value("r", "96"), Some("F".to_string()));
    }

    #[test]
    fn test_status_reports_every_field() {
        let sync = synchronizer();
        sync.store().insert("r", "88", "Lieber Vater,");
        sync.store().insert("r", "94", "reviewed");
        sync.store().fail_reads_for("100");

        let status = sync.status("r").unwrap();
        assert_eq!(status.fields.len(), sync.policy().len());

        let raw = status.field(layers::RAW).unwrap();
        assert!(raw.populated);
        assert_eq!(raw.chars, 13);
        assert_eq!(raw.value, None);

        let review = status.field(layers::LITERAL_REVIEW_STATUS).unwrap();
        assert_eq!(review.value.as_deref(), Some("reviewed"));

        let version = status.field(layers::PROCESSING_VERSION).unwrap();
        assert!(version.error.is_some());
        assert!(!version.populated);
    }
}
