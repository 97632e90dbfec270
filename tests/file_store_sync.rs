//! File Store Sync Tests
//!
//! End-to-end tests over the JSON file store and audit log:
//! - Layers survive reopening the store
//! - Consensus output feeds the raw layer
//! - Corrupt records are reported, not overwritten
//! - Every sync appends one audit line

use std::fs;

use palimpsest::cli::{
    build_proposals, resolve_batch, run_sync, Config, LayerTexts, RawLayer, SyncArgs,
};
use palimpsest::consensus::{ConsensusResolver, EngineReading};
use palimpsest::observability::FileAuditLog;
use palimpsest::policy::{layers, PolicyTable};
use palimpsest::store::{FieldStore, JsonFileStore};
use palimpsest::sync::{ChangeAction, FieldSynchronizer, Proposal, ProposalSet};
use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open(dir: &TempDir) -> FieldSynchronizer<JsonFileStore> {
    FieldSynchronizer::new(
        JsonFileStore::new(dir.path().join("archive")),
        PolicyTable::archival_default(),
    )
}

fn sync_args(resource_id: &str) -> SyncArgs {
    SyncArgs {
        resource_id: resource_id.to_string(),
        ..Default::default()
    }
}

// =============================================================================
// Persistence Tests
// =============================================================================

/// Values written through one store instance are seen by the next.
#[test]
fn test_layers_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let proposals = ProposalSet::new()
        .with(layers::RAW, Proposal::new("Lieber Vater"))
        .with(layers::FORMATTED, Proposal::new("Lieber Vater,"));
    open(&tmp).sync("p001", &proposals).unwrap();

    let reopened = open(&tmp);
    assert_eq!(
        reopened.store().get("p001", "88").unwrap().as_deref(),
        Some("Lieber Vater")
    );

    let again = reopened.sync("p001", &proposals).unwrap();
    assert!(!again.wrote_anything());

    let status = reopened.status("p001").unwrap();
    assert_eq!(status.populated_count(), 2);
    assert_eq!(status.field("raw").unwrap().chars, 12);
    assert!(status.field("raw").unwrap().value.is_none());
}

/// A corrupt record fails every field of that resource and is left alone.
#[test]
fn test_corrupt_record_reported() {
    let tmp = TempDir::new().unwrap();
    let sync = open(&tmp);
    let root = tmp.path().join("archive");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("p002.json"), "{ not json").unwrap();

    let result = sync
        .sync("p002", &ProposalSet::new().with(layers::RAW, Proposal::new("x")))
        .unwrap();
    assert!(!result.success());
    assert!(result.changes().is_empty());
    assert_eq!(fs::read_to_string(root.join("p002.json")).unwrap(), "{ not json");

    assert!(sync.status("p002").unwrap().has_errors());
}

// =============================================================================
// Pipeline Tests
// =============================================================================

/// Consensus text becomes the raw layer with its engines recorded.
#[test]
fn test_consensus_feeds_raw_layer() {
    let tmp = TempDir::new().unwrap();
    let sync = open(&tmp);

    let readings = vec![
        EngineReading::new("docai", "Mein lieber Sohn"),
        EngineReading::new("vision", "Mein lieber Sohn"),
        EngineReading::new("claude", "Mein liber Sohn"),
    ];
    let result = ConsensusResolver::default().resolve(&readings, 4).unwrap();
    let texts = LayerTexts {
        raw: Some(RawLayer {
            engine: format!("consensus:{}", result.engines_used.join(",")),
            text: result.text.clone(),
        }),
        ..Default::default()
    };

    let proposals = build_proposals(&sync_args("p003"), &texts, sync.policy());
    let audit_path = tmp.path().join("audit.log");
    let audit = FileAuditLog::open(&audit_path).unwrap();
    let outcome = run_sync(&sync, "p003", &proposals, Some(&audit)).unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.change_for("88").unwrap().action, ChangeAction::Created);
    assert_eq!(
        sync.store().get("p003", "88").unwrap().as_deref(),
        Some("Mein lieber Sohn")
    );
    assert_eq!(
        sync.store().get("p003", "90").unwrap().as_deref(),
        Some("consensus:docai,vision,claude")
    );

    drop(audit);
    let log = fs::read_to_string(&audit_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["action"], "SYNC");
    assert_eq!(record["subject"], "p003");
    assert_eq!(record["outcome"], "SUCCESS");
}

/// A batch with one unreadable page still resolves the rest.
#[test]
fn test_batch_continues_past_bad_page() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(input.path().join("p001.docai.txt"), "Haus am See").unwrap();
    fs::write(input.path().join("p001.vision.txt"), "Haus am See").unwrap();
    fs::write(input.path().join("p002.docai.txt"), [0xff, 0xfe, 0x00]).unwrap();

    let summary = resolve_batch(
        &ConsensusResolver::default(),
        input.path(),
        output.path(),
        None,
        2,
        None,
    )
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert!(summary.pages[1].error.is_some());
    assert!(output.path().join("p001.txt").exists());
    assert!(!output.path().join("p002.txt").exists());
}

/// Config defaults point the store at ./archive with the archival table.
#[test]
fn test_default_config() {
    let config = Config::load_or_default(None).unwrap();
    assert_eq!(config.store_path(), std::path::Path::new("./archive"));
    assert_eq!(config.policy_table().unwrap().version(), "archival-1");
}
