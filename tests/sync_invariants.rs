//! Field Sync Invariant Tests
//!
//! Tests for synchronizer invariants:
//! - Re-running identical proposals writes nothing
//! - Immutable layers are never overwritten
//! - Write-once layers only move with force
//! - Review status only moves up the ladder
//! - One failing field never blocks its siblings

use palimpsest::policy::{layers, PolicyTable};
use palimpsest::store::MemoryStore;
use palimpsest::sync::{ChangeAction, FieldSynchronizer, Proposal, ProposalSet, SyncResult};

// =============================================================================
// Helper Functions
// =============================================================================

fn synchronizer() -> FieldSynchronizer<MemoryStore> {
    FieldSynchronizer::new(MemoryStore::new(), PolicyTable::archival_default())
}

fn one(key: &str, value: &str) -> ProposalSet {
    ProposalSet::new().with(key, Proposal::new(value))
}

fn action(result: &SyncResult, field_id: &str) -> ChangeAction {
    result
        .change_for(field_id)
        .unwrap_or_else(|| panic!("no change for field {}", field_id))
        .action
}

fn full_page() -> ProposalSet {
    ProposalSet::new()
        .with(layers::RAW, Proposal::new("Lieber Vater, wie geht es dir"))
        .with(layers::LITERAL, Proposal::new("Lieber Vater, wie geht es dir?"))
        .with(layers::FORMATTED, Proposal::new("Lieber Vater,\n\nwie geht es dir?"))
        .with(layers::LITERAL_REVIEW_STATUS, Proposal::new("reviewed"))
        .with(layers::OCR_ENGINE, Proposal::new("google_document_ai"))
        .with(layers::PROCESSING_VERSION, Proposal::new("v1.0.0"))
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Raw text is created once and never replaced.
#[test]
fn test_raw_created_then_immutable() {
    let sync = synchronizer();

    let first = sync.sync("page-1", &one(layers::RAW, "abc")).unwrap();
    assert!(first.success());
    assert_eq!(action(&first, "88"), ChangeAction::Created);

    let second = sync.sync("page-1", &one(layers::RAW, "xyz")).unwrap();
    assert!(second.success());
    let change = second.change_for("88").unwrap();
    assert_eq!(change.action, ChangeAction::Skipped);
    assert!(change.reason.as_deref().unwrap().contains("immutable"));
    assert_eq!(sync.store().value("page-1", "88").as_deref(), Some("abc"));
}

/// Approved review status is never downgraded.
#[test]
fn test_approved_status_not_downgraded() {
    let sync = synchronizer();
    sync.store().insert("page-1", "94", "approved");

    let result = sync
        .sync("page-1", &one(layers::LITERAL_REVIEW_STATUS, "unreviewed"))
        .unwrap();
    assert_eq!(action(&result, "94"), ChangeAction::Skipped);
    assert_eq!(sync.store().value("page-1", "94").as_deref(), Some("approved"));
}

// =============================================================================
// Idempotence Tests
// =============================================================================

/// A second identical sync reports no writes and performs none.
#[test]
fn test_resync_is_idempotent() {
    let sync = synchronizer();
    let proposals = full_page();

    let first = sync.sync("page-2", &proposals).unwrap();
    assert!(first.success());
    assert_eq!(first.counts().created, proposals.len());
    let writes = sync.store().write_count();

    let second = sync.sync("page-2", &proposals).unwrap();
    assert!(second.success());
    assert!(!second.wrote_anything());
    assert_eq!(sync.store().write_count(), writes);
    for change in second.changes() {
        assert!(
            matches!(change.action, ChangeAction::Unchanged | ChangeAction::Skipped),
            "{}",
            change
        );
    }
}

/// Every change names both its field id and its layer.
#[test]
fn test_changes_carry_field_and_layer() {
    let sync = synchronizer();
    let result = sync.sync("page-3", &full_page()).unwrap();

    let raw = result.change_for("88").unwrap();
    assert_eq!(raw.layer, "raw");
    let literal = result.change_for("89").unwrap();
    assert_eq!(literal.layer, "literal");
}

// =============================================================================
// Rule Tests
// =============================================================================

/// Write-once literal: kept without force, replaced with force.
#[test]
fn test_write_once_requires_force() {
    let sync = synchronizer();
    sync.sync("p", &one(layers::LITERAL, "first")).unwrap();

    let result = sync.sync("p", &one(layers::LITERAL, "second")).unwrap();
    let change = result.change_for("89").unwrap();
    assert_eq!(change.action, ChangeAction::Skipped);
    assert!(change.reason.as_deref().unwrap().contains("force"));
    assert_eq!(sync.store().value("p", "89").as_deref(), Some("first"));

    let forced = ProposalSet::new().with(layers::LITERAL, Proposal::forced("second"));
    let result = sync.sync("p", &forced).unwrap();
    assert_eq!(action(&result, "89"), ChangeAction::Updated);
    assert_eq!(sync.store().value("p", "89").as_deref(), Some("second"));
}

/// Iterable layers follow the latest proposal.
#[test]
fn test_iterable_updates() {
    let sync = synchronizer();
    sync.sync("p", &one(layers::FORMATTED, "v1")).unwrap();

    let result = sync.sync("p", &one(layers::FORMATTED, "v2")).unwrap();
    assert_eq!(action(&result, "96"), ChangeAction::Updated);
    assert_eq!(sync.store().value("p", "96").as_deref(), Some("v2"));
}

/// Review status climbs unreviewed -> reviewed -> approved and stays there.
#[test]
fn test_status_ladder() {
    let sync = synchronizer();
    let steps = [
        ("unreviewed", ChangeAction::Created, "unreviewed"),
        ("reviewed", ChangeAction::Updated, "reviewed"),
        ("approved", ChangeAction::Updated, "approved"),
        ("reviewed", ChangeAction::Skipped, "approved"),
        ("approved", ChangeAction::Unchanged, "approved"),
        ("draft", ChangeAction::Skipped, "approved"),
    ];

    for (proposed, expected, stored) in steps {
        let result = sync
            .sync("p", &one(layers::FORMATTED_REVIEW_STATUS, proposed))
            .unwrap();
        assert_eq!(action(&result, "98"), expected, "proposing {}", proposed);
        assert_eq!(sync.store().value("p", "98").as_deref(), Some(stored));
    }
}

/// Padded status text is not a rank and is never written over one.
#[test]
fn test_padded_status_not_written() {
    let sync = synchronizer();
    sync.store().insert("p", "98", "unreviewed");

    let result = sync
        .sync("p", &one(layers::FORMATTED_REVIEW_STATUS, " approved\n"))
        .unwrap();
    assert_eq!(action(&result, "98"), ChangeAction::Skipped);
    assert_eq!(sync.store().value("p", "98").as_deref(), Some("unreviewed"));

    let result = sync
        .sync("p", &one(layers::FORMATTED_REVIEW_STATUS, "approved"))
        .unwrap();
    assert_eq!(action(&result, "98"), ChangeAction::Updated);
}

/// Whenever a field is reported unchanged, the store holds the proposal.
#[test]
fn test_unchanged_matches_stored_value() {
    let sync = synchronizer();
    let values = ["unreviewed", " approved\n", "approved", "approved", "reviewed "];

    for value in values {
        let proposals = ProposalSet::new()
            .with(layers::LITERAL_REVIEW_STATUS, Proposal::new(value))
            .with(layers::FORMATTED, Proposal::new(value));
        let result = sync.sync("p", &proposals).unwrap();

        for change in result.changes() {
            if change.action == ChangeAction::Unchanged {
                assert_eq!(
                    sync.store().value("p", &change.field_id).as_deref(),
                    Some(value),
                    "{}",
                    change
                );
            }
        }
    }
}

/// A blank proposal never clears a stored value.
#[test]
fn test_blank_proposal_skipped() {
    let sync = synchronizer();
    sync.store().insert("p", "96", "kept");

    let result = sync.sync("p", &one(layers::FORMATTED, "   ")).unwrap();
    assert_eq!(action(&result, "96"), ChangeAction::Skipped);
    assert_eq!(sync.store().value("p", "96").as_deref(), Some("kept"));
}

// =============================================================================
// Failure Isolation Tests
// =============================================================================

/// A write failure on one field leaves the others applied.
#[test]
fn test_write_failure_isolated() {
    let sync = synchronizer();
    sync.store().fail_writes_for("89");

    let result = sync.sync("p", &full_page()).unwrap();
    assert!(!result.success());
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].contains("89"));
    assert!(result.change_for("89").is_none());

    assert_eq!(action(&result, "88"), ChangeAction::Created);
    assert_eq!(action(&result, "96"), ChangeAction::Created);
    assert!(sync.store().value("p", "89").is_none());
}

/// Unknown and malformed entries are reported per field.
#[test]
fn test_invalid_entries_reported_per_field() {
    let sync = synchronizer();
    let doc = serde_json::json!({
        "raw": "text",
        "no_such_layer": "x",
        "96": 42
    });
    let proposals = ProposalSet::from_json(&doc).unwrap();

    let result = sync.sync("p", &proposals).unwrap();
    assert!(!result.success());
    assert_eq!(result.errors().len(), 2);
    assert_eq!(action(&result, "88"), ChangeAction::Created);
}

/// Blank resource ids fail the whole call.
#[test]
fn test_blank_resource_rejected() {
    let sync = synchronizer();
    assert!(sync.sync("  ", &one(layers::RAW, "x")).is_err());
    assert_eq!(sync.store().write_count(), 0);
}
