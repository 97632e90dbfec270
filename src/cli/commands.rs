//! CLI command implementations
//!
//! Every command loads the configuration first, then builds the policy
//! table, store, resolver and audit log it needs. Nothing is written before
//! all inputs have been read and validated.
//!
//! Exit status:
//! - 0: everything succeeded
//! - 2: completed, but some field or page failed
//! - 1: nothing could be done (returned as `CliError`)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use crate::consensus::{ConsensusReport, ConsensusResolver, ConsensusResult, ConsensusTier, EngineReading};
use crate::observability::{
    log_event_with_fields, AuditAction, AuditLog, AuditOutcome, AuditRecord, Event, FileAuditLog,
    Logger, Severity,
};
use crate::policy::{layers, PolicyTable};
use crate::store::{FieldStore, JsonFileStore};
use crate::sync::{FieldSynchronizer, Proposal, ProposalSet, ResourceStatus, SyncResult};

use super::args::{Cli, Command, ReadingArg, ResolveArgs, SyncArgs};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_request, read_text, write_lines, write_response, write_text};

pub const OCR_STATUS_DONE: &str = "done";
pub const DEFAULT_OCR_ENGINE: &str = "google_document_ai";
pub const DEFAULT_TRANSCRIPTION_METHOD: &str = "ai_spelling_normalisation_only";
pub const DEFAULT_TRANSCRIPTION_NOTES: &str = "spelling normalised only; tone and wording preserved";
pub const DEFAULT_LITERAL_REVIEW: &str = "reviewed";
pub const DEFAULT_FORMATTING_METHOD: &str = "ai_formatting_only_non_editorial";
pub const DEFAULT_FORMATTING_NOTES: &str = "paragraphing/punctuation/headers only; no rewriting";
pub const DEFAULT_FORMATTED_REVIEW: &str = "unreviewed";

/// Process exit status of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    CompletedWithErrors,
    Failure,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::CompletedWithErrors => 2,
        }
    }

    fn from_success(success: bool) -> Self {
        if success {
            ExitStatus::Success
        } else {
            ExitStatus::CompletedWithErrors
        }
    }
}

/// Exit status of a finished command; any `CliError` is a failure.
pub fn exit_status(result: &CliResult<ExitStatus>) -> ExitStatus {
    match result {
        Ok(status) => *status,
        Err(_) => ExitStatus::Failure,
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<ExitStatus> {
    run_command(Cli::parse_args())
}

/// Run the appropriate command based on CLI args
pub fn run_command(cli: Cli) -> CliResult<ExitStatus> {
    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }

    let config = Config::load_or_default(cli.config.as_deref())?;
    let source = cli
        .config
        .as_ref()
        .map_or_else(|| "<defaults>".to_string(), |p| p.display().to_string());
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("config", source.as_str()), ("store_dir", config.store_dir.as_str())],
    );

    match cli.command {
        Command::Resolve(args) => resolve(&config, &args),
        Command::Sync(args) => sync(&config, &args),
        Command::Apply { input, json } => apply(&config, input.as_deref(), json),
        Command::Status { resource_id, json } => status(&config, &resource_id, json),
        Command::Fields { json } => fields(&config, json),
    }
}

// ============================================================================
// resolve
// ============================================================================

/// Resolve one page, or every page of a batch directory.
pub fn resolve(config: &Config, args: &ResolveArgs) -> CliResult<ExitStatus> {
    let resolver = config.resolver()?;
    let expected = args.expected.unwrap_or(config.engines_expected);
    let audit = open_audit(config)?;

    if let Some(input_dir) = &args.input_dir {
        let output_dir = args
            .output_dir
            .as_deref()
            .ok_or_else(|| CliError::invalid_input("--output-dir is required with --input-dir"))?;
        let summary = resolve_batch(
            &resolver,
            input_dir,
            output_dir,
            args.report_dir.as_deref(),
            expected,
            audit.as_ref().map(|a| a as &dyn AuditLog),
        )?;

        if args.json {
            write_response(&summary)?;
        } else {
            write_lines(summary.lines())?;
        }
        return Ok(ExitStatus::from_success(summary.failed == 0));
    }

    if args.readings.is_empty() {
        return Err(CliError::invalid_input(
            "at least one --reading <engine>=<file> or --input-dir is required",
        ));
    }

    let readings = load_readings(&args.readings)?;
    let source = page_name(&args.readings[0].path);
    let result = resolver.resolve(&readings, expected)?;
    let report = ConsensusReport::new(source.clone(), &readings, &result);

    if let Some(path) = &args.output {
        write_text(path, &result.text)?;
        log_written("text", path);
        if let Some(audit) = &audit {
            append_resolve_audit(audit, &source, &result)?;
        }
    }
    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }

    if args.json {
        write_response(&report)?;
    } else if args.output.is_none() {
        write_lines([result.text.as_str()])?;
    } else {
        write_lines([summarize_consensus(&source, &result)])?;
    }

    Ok(ExitStatus::Success)
}

/// Read `--reading` files into engine readings.
pub fn load_readings(args: &[ReadingArg]) -> CliResult<Vec<EngineReading>> {
    args.iter()
        .map(|r| Ok(EngineReading::new(r.engine_id.clone(), read_text(&r.path)?)))
        .collect()
}

/// Page name of a reading file: `scans/p001.docai.txt` -> `p001`.
fn page_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .filter(|n| !n.is_empty())
        .unwrap_or("page")
        .to_string()
}

fn write_report(report: &ConsensusReport, path: &Path) -> CliResult<()> {
    report
        .write_to(path)
        .map_err(|e| CliError::io_error(format!("Failed to write {}: {}", path.display(), e)))?;
    log_written("report", path);
    Ok(())
}

fn log_written(kind: &str, path: &Path) {
    let path = path.display().to_string();
    log_event_with_fields(Event::ReportWritten, &[("kind", kind), ("path", path.as_str())]);
}

fn summarize_consensus(source: &str, result: &ConsensusResult) -> String {
    format!(
        "{}: {} ({}/{} engines, {} positions, {} disagreements)",
        source,
        result.tier,
        result.agreement_count,
        result.total_engines,
        result.positions,
        result.disagreements.len()
    )
}

fn append_resolve_audit(audit: &dyn AuditLog, page: &str, result: &ConsensusResult) -> CliResult<()> {
    let outcome = match result.tier {
        ConsensusTier::None => AuditOutcome::Partial,
        _ => AuditOutcome::Success,
    };
    let record = AuditRecord::new(AuditAction::Resolve, page, outcome).with_detail(json!({
        "tier": result.tier,
        "agreement_count": result.agreement_count,
        "total_engines": result.total_engines,
        "positions": result.positions,
        "disagreements": result.disagreements.len(),
        "engines_used": result.engines_used,
    }));
    audit
        .append(&record)
        .map_err(|e| CliError::io_error(format!("Failed to append audit record: {}", e)))
}

/// Outcome of one page of a batch
#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    pub page: String,
    pub engines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<ConsensusTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disagreements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a batch resolve
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub pages: Vec<PageOutcome>,
    pub failed: usize,
}

impl BatchSummary {
    fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .pages
            .iter()
            .map(|p| match (&p.error, p.tier) {
                (Some(err), _) => format!("{}: FAILED {}", p.page, err),
                (None, Some(tier)) => format!(
                    "{}: {} ({} disagreements)",
                    p.page,
                    tier,
                    p.disagreements.unwrap_or(0)
                ),
                (None, None) => format!("{}: skipped", p.page),
            })
            .collect();
        lines.push(format!(
            "{} pages, {} failed",
            self.pages.len(),
            self.failed
        ));
        lines
    }
}

/// Group `<page>.<engine>.txt` files of `dir` by page.
///
/// Files without an engine part are ignored. Pages and their readings are
/// returned in name order.
pub fn collect_pages(dir: &Path) -> CliResult<BTreeMap<String, Vec<ReadingArg>>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", dir.display(), e)))?;

    let mut pages: BTreeMap<String, Vec<ReadingArg>> = BTreeMap::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some((page, engine)) = stem.rsplit_once('.') else {
            continue;
        };
        if page.is_empty() || engine.is_empty() {
            continue;
        }
        pages.entry(page.to_string()).or_default().push(ReadingArg {
            engine_id: engine.to_string(),
            path: path.clone(),
        });
    }

    for readings in pages.values_mut() {
        readings.sort_by(|a, b| a.engine_id.cmp(&b.engine_id));
    }
    Ok(pages)
}

/// Resolve every page of `input_dir`. A failing page does not stop the batch.
pub fn resolve_batch(
    resolver: &ConsensusResolver,
    input_dir: &Path,
    output_dir: &Path,
    report_dir: Option<&Path>,
    expected: usize,
    audit: Option<&dyn AuditLog>,
) -> CliResult<BatchSummary> {
    let pages = collect_pages(input_dir)?;
    if pages.is_empty() {
        return Err(CliError::invalid_input(format!(
            "no <page>.<engine>.txt files in {}",
            input_dir.display()
        )));
    }

    let mut summary = BatchSummary {
        pages: Vec::with_capacity(pages.len()),
        failed: 0,
    };

    for (page, files) in &pages {
        let engines = files.iter().map(|f| f.engine_id.clone()).collect();
        match resolve_page(resolver, page, files, output_dir, report_dir, expected, audit) {
            Ok(result) => summary.pages.push(PageOutcome {
                page: page.clone(),
                engines,
                tier: Some(result.tier),
                disagreements: Some(result.disagreements.len()),
                error: None,
            }),
            Err(e) => {
                let message = e.to_string();
                log_event_with_fields(
                    Event::BatchPageFailed,
                    &[("page", page.as_str()), ("error", message.as_str())],
                );
                summary.failed += 1;
                summary.pages.push(PageOutcome {
                    page: page.clone(),
                    engines,
                    tier: None,
                    disagreements: None,
                    error: Some(message),
                });
            }
        }
    }

    Ok(summary)
}

fn resolve_page(
    resolver: &ConsensusResolver,
    page: &str,
    files: &[ReadingArg],
    output_dir: &Path,
    report_dir: Option<&Path>,
    expected: usize,
    audit: Option<&dyn AuditLog>,
) -> CliResult<ConsensusResult> {
    let readings = load_readings(files)?;
    let result = resolver.resolve(&readings, expected)?;

    let output = output_dir.join(format!("{}.txt", page));
    write_text(&output, &result.text)?;
    log_written("text", &output);

    if let Some(dir) = report_dir {
        let report = ConsensusReport::new(page, &readings, &result);
        write_report(&report, &dir.join(format!("{}.report.json", page)))?;
    }
    if let Some(audit) = audit {
        append_resolve_audit(audit, page, &result)?;
    }

    Ok(result)
}

// ============================================================================
// sync / apply
// ============================================================================

/// Raw layer text and the engine it is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLayer {
    pub text: String,
    pub engine: String,
}

/// Layer texts loaded for one `sync` call
#[derive(Debug, Clone, Default)]
pub struct LayerTexts {
    pub raw: Option<RawLayer>,
    pub literal: Option<String>,
    pub formatted: Option<String>,
    pub translation: Option<String>,
}

/// Sync the layers named on the command line into one resource.
pub fn sync(config: &Config, args: &SyncArgs) -> CliResult<ExitStatus> {
    JsonFileStore::check_resource_id(&args.resource_id)
        .map_err(|e| CliError::invalid_input(e.to_string()))?;

    let synchronizer = open_synchronizer(config)?;
    let texts = LayerTexts {
        raw: raw_layer(config, args)?,
        literal: args.literal.as_deref().map(read_text).transpose()?,
        formatted: args.formatted.as_deref().map(read_text).transpose()?,
        translation: args.translation.as_deref().map(read_text).transpose()?,
    };

    let proposals = build_proposals(args, &texts, synchronizer.policy());
    if proposals.is_empty() {
        return Err(CliError::invalid_input(
            "nothing to sync: give --raw, --reading, --literal, --formatted, --translation or --processing-version",
        ));
    }

    let audit = open_audit(config)?;
    let result = run_sync(
        &synchronizer,
        &args.resource_id,
        &proposals,
        audit.as_ref().map(|a| a as &dyn AuditLog),
    )?;
    print_sync_result(&result, args.json)?;

    Ok(ExitStatus::from_success(result.success()))
}

/// Raw layer from `--raw`, or the consensus of `--reading` files.
fn raw_layer(config: &Config, args: &SyncArgs) -> CliResult<Option<RawLayer>> {
    if let Some(path) = &args.raw {
        return Ok(Some(RawLayer {
            text: read_text(path)?,
            engine: args
                .engine
                .clone()
                .unwrap_or_else(|| DEFAULT_OCR_ENGINE.to_string()),
        }));
    }
    if args.readings.is_empty() {
        return Ok(None);
    }

    let readings = load_readings(&args.readings)?;
    let expected = args.expected.unwrap_or(config.engines_expected);
    let result = config.resolver()?.resolve(&readings, expected)?;

    if let Some(path) = &args.report {
        let report = ConsensusReport::new(args.resource_id.clone(), &readings, &result);
        write_report(&report, path)?;
    }

    if result.text.trim().is_empty() {
        let excluded = result.excluded.len().to_string();
        log_event_with_fields(
            Event::ConsensusUnverified,
            &[("resource_id", args.resource_id.as_str()), ("excluded", excluded.as_str())],
        );
        return Ok(None);
    }

    Ok(Some(RawLayer {
        engine: format!("consensus:{}", result.engines_used.join(",")),
        text: result.text,
    }))
}

/// Turn layer texts into proposals, adding each layer's companion metadata.
///
/// Companion fields absent from the policy table are left out; the layers
/// themselves are always proposed so an unknown layer is reported.
pub fn build_proposals(args: &SyncArgs, texts: &LayerTexts, policy: &PolicyTable) -> ProposalSet {
    let mut set = ProposalSet::new();
    let companion = |set: &mut ProposalSet, key: &str, value: &str| {
        if policy.resolve(key).is_some() {
            set.insert(key, Proposal::new(value));
        }
    };

    if let Some(raw) = &texts.raw {
        set.insert(layers::RAW, Proposal::new(raw.text.clone()));
        companion(&mut set, layers::OCR_ENGINE, &raw.engine);
        companion(&mut set, layers::OCR_STATUS, OCR_STATUS_DONE);
        if let Some(lang) = &args.lang {
            companion(&mut set, layers::OCR_LANGUAGE, lang);
        }
    }

    if let Some(text) = &texts.literal {
        let proposal = if args.force_literal {
            Proposal::forced(text.clone())
        } else {
            Proposal::new(text.clone())
        };
        set.insert(layers::LITERAL, proposal);
        companion(
            &mut set,
            layers::TRANSCRIPTION_METHOD,
            args.transcription_method.as_deref().unwrap_or(DEFAULT_TRANSCRIPTION_METHOD),
        );
        companion(
            &mut set,
            layers::LITERAL_REVIEW_STATUS,
            args.literal_review.as_deref().unwrap_or(DEFAULT_LITERAL_REVIEW),
        );
        companion(
            &mut set,
            layers::TRANSCRIPTION_NOTES,
            args.transcription_notes.as_deref().unwrap_or(DEFAULT_TRANSCRIPTION_NOTES),
        );
    }

    if let Some(text) = &texts.formatted {
        set.insert(layers::FORMATTED, Proposal::new(text.clone()));
        companion(
            &mut set,
            layers::FORMATTING_METHOD,
            args.formatting_method.as_deref().unwrap_or(DEFAULT_FORMATTING_METHOD),
        );
        companion(
            &mut set,
            layers::FORMATTED_REVIEW_STATUS,
            args.formatted_review.as_deref().unwrap_or(DEFAULT_FORMATTED_REVIEW),
        );
        companion(
            &mut set,
            layers::FORMATTING_NOTES,
            args.formatting_notes.as_deref().unwrap_or(DEFAULT_FORMATTING_NOTES),
        );
    }

    if let Some(text) = &texts.translation {
        set.insert(layers::TRANSLATION, Proposal::new(text.clone()));
        if let Some(lang) = &args.target_lang {
            companion(&mut set, layers::TRANSLATION_LANGUAGE, lang);
        }
    }

    if let Some(version) = &args.processing_version {
        set.insert(layers::PROCESSING_VERSION, Proposal::new(version.clone()));
    }

    set
}

/// Sync and append the audit record.
pub fn run_sync<S: FieldStore>(
    synchronizer: &FieldSynchronizer<S>,
    resource_id: &str,
    proposals: &ProposalSet,
    audit: Option<&dyn AuditLog>,
) -> CliResult<SyncResult> {
    let result = synchronizer.sync(resource_id, proposals)?;

    if let Some(audit) = audit {
        let outcome = if result.success() {
            AuditOutcome::Success
        } else if result.changes().is_empty() {
            AuditOutcome::Failed
        } else {
            AuditOutcome::Partial
        };
        let record = AuditRecord::new(AuditAction::Sync, resource_id, outcome)
            .with_detail(serde_json::to_value(&result)?);
        audit
            .append(&record)
            .map_err(|e| CliError::io_error(format!("Failed to append audit record: {}", e)))?;
    }

    Ok(result)
}

/// Human-readable sync report; reasons are printed verbatim.
pub fn sync_report_lines(result: &SyncResult) -> Vec<String> {
    let mut lines = vec![format!("Resource {}", result.resource_id())];
    lines.extend(result.changes().iter().map(|c| format!("  {}", c)));
    lines.extend(result.errors().iter().map(|e| format!("  error: {}", e)));

    let counts = result.counts();
    let totals = format!(
        "{} created, {} updated, {} skipped, {} unchanged",
        counts.created, counts.updated, counts.skipped, counts.unchanged
    );
    if result.success() {
        lines.push(format!("Sync complete: {}", totals));
    } else {
        lines.push(format!(
            "Sync completed with {} error(s): {}",
            result.errors().len(),
            totals
        ));
    }
    lines
}

fn print_sync_result(result: &SyncResult, json: bool) -> CliResult<()> {
    if json {
        write_response(result)
    } else {
        write_lines(sync_report_lines(result))
    }
}

/// Apply a `{"resource_id": ..., "proposals": {...}}` document.
pub fn apply(config: &Config, input: Option<&Path>, json: bool) -> CliResult<ExitStatus> {
    let doc = read_request(input)?;
    let (resource_id, proposals) = parse_proposal_document(&doc)?;
    JsonFileStore::check_resource_id(&resource_id)
        .map_err(|e| CliError::invalid_input(e.to_string()))?;

    let synchronizer = open_synchronizer(config)?;
    let audit = open_audit(config)?;
    let result = run_sync(
        &synchronizer,
        &resource_id,
        &proposals,
        audit.as_ref().map(|a| a as &dyn AuditLog),
    )?;
    print_sync_result(&result, json)?;

    Ok(ExitStatus::from_success(result.success()))
}

/// Split a proposal document into resource id and proposals.
///
/// `resource_id` may be a string or an integer.
pub fn parse_proposal_document(doc: &Value) -> CliResult<(String, ProposalSet)> {
    let resource_id = match doc.get("resource_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) if n.is_u64() => n.to_string(),
        Some(_) => {
            return Err(CliError::invalid_input(
                "resource_id must be a non-empty string or a non-negative integer",
            ))
        }
        None => return Err(CliError::invalid_input("missing \"resource_id\"")),
    };

    let proposals = doc
        .get("proposals")
        .ok_or_else(|| CliError::invalid_input("missing \"proposals\""))?;

    Ok((resource_id, ProposalSet::from_json(proposals)?))
}

// ============================================================================
// status / fields
// ============================================================================

/// Show every configured field of a resource.
pub fn status(config: &Config, resource_id: &str, json: bool) -> CliResult<ExitStatus> {
    JsonFileStore::check_resource_id(resource_id)
        .map_err(|e| CliError::invalid_input(e.to_string()))?;

    let status = open_synchronizer(config)?.status(resource_id)?;
    if json {
        write_response(&status)?;
    } else {
        write_lines(status_lines(&status))?;
    }

    Ok(ExitStatus::from_success(!status.has_errors()))
}

pub fn status_lines(status: &ResourceStatus) -> Vec<String> {
    let mut lines = vec![format!(
        "Resource {} (policy {}, {}/{} fields set)",
        status.resource_id,
        status.policy_version,
        status.populated_count(),
        status.fields.len()
    )];
    for field in &status.fields {
        let state = match (&field.error, &field.value) {
            (Some(err), _) => format!("ERROR {}", err),
            (None, _) if !field.populated => "(not set)".to_string(),
            (None, Some(value)) => value.clone(),
            (None, None) => format!("{} chars", field.chars),
        };
        lines.push(format!(
            "  {:<24} {:>5}  {:<16} {}",
            field.layer, field.field_id, field.rule, state
        ));
    }
    lines
}

/// Print the active policy table.
pub fn fields(config: &Config, json: bool) -> CliResult<ExitStatus> {
    let table = config.policy_table()?;
    if json {
        write_response(&table.to_document())?;
    } else {
        let mut lines = vec![format!("Policy {} ({} fields)", table.version(), table.len())];
        lines.extend(table.iter().map(|f| {
            format!(
                "  {:>5}  {:<24} {:<16} {}",
                f.field_id,
                f.layer,
                f.rule,
                if f.content { "content" } else { "metadata" }
            )
        }));
        write_lines(lines)?;
    }
    Ok(ExitStatus::Success)
}

// ============================================================================
// helpers
// ============================================================================

fn open_synchronizer(config: &Config) -> CliResult<FieldSynchronizer<JsonFileStore>> {
    let policy = config.policy_table()?;
    let count = policy.len().to_string();
    log_event_with_fields(
        Event::PolicyLoaded,
        &[("version", policy.version()), ("fields", count.as_str())],
    );
    Ok(FieldSynchronizer::new(
        JsonFileStore::new(config.store_path()),
        policy,
    ))
}

fn open_audit(config: &Config) -> CliResult<Option<FileAuditLog>> {
    config
        .audit_log
        .as_ref()
        .map(|path: &PathBuf| {
            FileAuditLog::open(path).map_err(|e| {
                CliError::io_error(format!("Failed to open audit log {}: {}", path.display(), e))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemoryAuditLog;
    use crate::store::MemoryStore;
    use crate::sync::ChangeAction;
    use tempfile::TempDir;

    fn args(resource_id: &str) -> SyncArgs {
        SyncArgs {
            resource_id: resource_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 1);
        assert_eq!(ExitStatus::CompletedWithErrors.code(), 2);
    }

    #[test]
    fn test_errors_exit_with_failure() {
        let failed: CliResult<ExitStatus> = Err(CliError::config_error("bad config"));
        assert_eq!(exit_status(&failed), ExitStatus::Failure);
        assert_eq!(exit_status(&failed).code(), 1);

        let partial: CliResult<ExitStatus> = Ok(ExitStatus::CompletedWithErrors);
        assert_eq!(exit_status(&partial).code(), 2);
    }

    #[test]
    fn test_companions_follow_layers() {
        let mut a = args("p1");
        a.lang = Some("de".into());
        a.processing_version = Some("v1.2.0".into());
        let texts = LayerTexts {
            raw: Some(RawLayer {
                text: "Lieber Vater".into(),
                engine: "consensus:docai,vision".into(),
            }),
            formatted: Some("Lieber Vater,".into()),
            ..Default::default()
        };

        let set = build_proposals(&a, &texts, &PolicyTable::archival_default());
        assert_eq!(set.get(layers::OCR_ENGINE).unwrap().value, "consensus:docai,vision");
        assert_eq!(set.get(layers::OCR_STATUS).unwrap().value, "done");
        assert_eq!(set.get(layers::OCR_LANGUAGE).unwrap().value, "de");
        assert_eq!(set.get(layers::FORMATTED_REVIEW_STATUS).unwrap().value, "unreviewed");
        assert_eq!(set.get(layers::PROCESSING_VERSION).unwrap().value, "v1.2.0");
        assert!(set.get(layers::LITERAL).is_none());
        assert!(set.get(layers::TRANSCRIPTION_METHOD).is_none());
    }

    #[test]
    fn test_force_literal_only_forces_literal() {
        let mut a = args("p1");
        a.force_literal = true;
        let texts = LayerTexts {
            literal: Some("text".into()),
            ..Default::default()
        };
        let set = build_proposals(&a, &texts, &PolicyTable::archival_default());
        assert!(set.get(layers::LITERAL).unwrap().force);
        assert!(!set.get(layers::TRANSCRIPTION_METHOD).unwrap().force);
        assert_eq!(set.get(layers::LITERAL_REVIEW_STATUS).unwrap().value, "reviewed");
    }

    #[test]
    fn test_companions_skipped_when_not_in_policy() {
        use crate::policy::{FieldPolicy, MutabilityRule};
        let policy = PolicyTable::new(
            "t",
            vec![FieldPolicy::content("1", layers::RAW, MutabilityRule::Immutable)],
        )
        .unwrap();
        let texts = LayerTexts {
            raw: Some(RawLayer {
                text: "x".into(),
                engine: "docai".into(),
            }),
            ..Default::default()
        };
        let set = build_proposals(&args("p"), &texts, &policy);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_formatted_review_never_downgrades() {
        let sync = FieldSynchronizer::new(MemoryStore::new(), PolicyTable::archival_default());
        sync.store().insert("p1", "98", "approved");
        let texts = LayerTexts {
            formatted: Some("v2".into()),
            ..Default::default()
        };
        let set = build_proposals(&args("p1"), &texts, sync.policy());

        let result = run_sync(&sync, "p1", &set, None).unwrap();
        assert!(result.success());
        assert_eq!(result.change_for("98").unwrap().action, ChangeAction::Skipped);
        assert_eq!(sync.store().value("p1", "98").as_deref(), Some("approved"));
    }

    #[test]
    fn test_run_sync_appends_audit_record() {
        let sync = FieldSynchronizer::new(MemoryStore::new(), PolicyTable::archival_default());
        sync.store().fail_writes_for("96");
        let audit = MemoryAuditLog::new();
        let set = ProposalSet::new()
            .with(layers::RAW, Proposal::new("a"))
            .with(layers::FORMATTED, Proposal::new("b"));

        let result = run_sync(&sync, "p1", &set, Some(&audit)).unwrap();
        assert!(!result.success());

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::Sync);
        assert_eq!(records[0].outcome, AuditOutcome::Partial);
        assert_eq!(records[0].detail["resource_id"], "p1");
        assert_eq!(records[0].detail["changes"][0]["action"], "created");
    }

    #[test]
    fn test_report_lines_print_reasons_verbatim() {
        let sync = FieldSynchronizer::new(MemoryStore::new(), PolicyTable::archival_default());
        sync.store().insert("p1", "88", "old");
        let set = ProposalSet::new().with(layers::RAW, Proposal::new("new"));
        let result = run_sync(&sync, "p1", &set, None).unwrap();

        let lines = sync_report_lines(&result);
        assert_eq!(lines[1], "  raw (88): skipped (immutable field already set)");
        assert_eq!(
            lines.last().unwrap(),
            "Sync complete: 0 created, 0 updated, 1 skipped, 0 unchanged"
        );
    }

    #[test]
    fn test_parse_proposal_document() {
        let doc = json!({
            "resource_id": 123,
            "proposals": {"raw": "text", "89": {"value": "lit", "force": true}}
        });
        let (id, set) = parse_proposal_document(&doc).unwrap();
        assert_eq!(id, "123");
        assert_eq!(set.len(), 2);
        assert!(set.get("89").unwrap().force);

        assert!(parse_proposal_document(&json!({"proposals": {}})).is_err());
        assert!(parse_proposal_document(&json!({"resource_id": "p"})).is_err());
        assert!(parse_proposal_document(&json!({"resource_id": "p", "proposals": []})).is_err());
    }

    #[test]
    fn test_collect_pages() {
        let tmp = TempDir::new().unwrap();
        for name in [
            "p002.vision.txt",
            "p001.vision.txt",
            "p001.docai.txt",
            "notes.txt",
            "p001.docai.json",
        ] {
            fs::write(tmp.path().join(name), "x").unwrap();
        }

        let pages = collect_pages(tmp.path()).unwrap();
        let names: Vec<_> = pages.keys().cloned().collect();
        assert_eq!(names, vec!["p001", "p002"]);
        let engines: Vec<_> = pages["p001"].iter().map(|r| r.engine_id.as_str()).collect();
        assert_eq!(engines, vec!["docai", "vision"]);
    }

    #[test]
    fn test_resolve_batch_writes_outputs() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        for (name, text) in [
            ("p001.docai.txt", "Lieber Vater"),
            ("p001.vision.txt", "Lieber Vater"),
            ("p002.docai.txt", "Liebe Mutter"),
        ] {
            fs::write(input.path().join(name), text).unwrap();
        }
        let reports = output.path().join("reports");
        let audit = MemoryAuditLog::new();

        let summary = resolve_batch(
            &ConsensusResolver::default(),
            input.path(),
            output.path(),
            Some(&reports),
            2,
            Some(&audit),
        )
        .unwrap();

        assert_eq!(summary.failed, 0);
        assert_eq!(summary.pages[0].tier, Some(ConsensusTier::Unanimous));
        assert_eq!(summary.pages[1].tier, Some(ConsensusTier::None));
        assert_eq!(
            fs::read_to_string(output.path().join("p001.txt")).unwrap(),
            "Lieber Vater\n"
        );
        assert!(reports.join("p002.report.json").exists());
        assert_eq!(audit.len(), 2);
    }

    #[test]
    fn test_page_name() {
        assert_eq!(page_name(Path::new("scans/p001.docai.txt")), "p001");
        assert_eq!(page_name(Path::new(".hidden")), "page");
    }
}
