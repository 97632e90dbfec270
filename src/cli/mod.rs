//! CLI module for palimpsest
//!
//! Provides command-line interface for:
//! - resolve: Merge OCR engine readings into consensus text
//! - sync: Write text layers of a resource under the field policy
//! - apply: Sync a JSON proposal document
//! - status: Show the stored layers of a resource
//! - fields: List the active policy table

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{parse_reading_arg, Cli, Command, ReadingArg, ResolveArgs, SyncArgs};
pub use commands::{
    apply, build_proposals, collect_pages, exit_status, fields, load_readings,
    parse_proposal_document, resolve, resolve_batch, run, run_command, run_sync, status,
    status_lines, sync, sync_report_lines, BatchSummary, ExitStatus, LayerTexts, PageOutcome,
    RawLayer,
};
pub use config::{Config, PolicySource};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, read_text, write_lines, write_response, write_text};
