//! CLI argument definitions using clap
//!
//! Commands:
//! - palimpsest resolve --reading <engine>=<file> ... [--output <file>] [--report <file>]
//! - palimpsest resolve --input-dir <dir> --output-dir <dir> [--report-dir <dir>]
//! - palimpsest sync --resource-id <id> [--raw <file> | --reading <engine>=<file> ...] ...
//! - palimpsest apply [--input <file>]
//! - palimpsest status --resource-id <id>
//! - palimpsest fields

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// palimpsest - layered archival transcriptions with OCR consensus
#[derive(Parser, Debug)]
#[command(name = "palimpsest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every field decision and unresolved position
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge OCR engine readings of a page into consensus text
    Resolve(ResolveArgs),

    /// Sync text layers of one resource into the store
    Sync(SyncArgs),

    /// Apply a JSON proposal document read from stdin or a file
    Apply {
        /// Read the document from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Print the sync result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the stored layers of a resource
    Status {
        #[arg(long)]
        resource_id: String,

        #[arg(long)]
        json: bool,
    },

    /// List the active field policy table
    Fields {
        #[arg(long)]
        json: bool,
    },
}

/// One `--reading <engine>=<file>` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingArg {
    pub engine_id: String,
    pub path: PathBuf,
}

/// Parse `<engine>=<file>`.
pub fn parse_reading_arg(s: &str) -> Result<ReadingArg, String> {
    let (engine, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <engine>=<file>, got '{}'", s))?;
    let engine = engine.trim();
    if engine.is_empty() {
        return Err(format!("missing engine id in '{}'", s));
    }
    if path.is_empty() {
        return Err(format!("missing file in '{}'", s));
    }
    Ok(ReadingArg {
        engine_id: engine.to_string(),
        path: PathBuf::from(path),
    })
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Engine reading as <engine>=<file>; repeat once per engine
    #[arg(long = "reading", value_name = "ENGINE=FILE", value_parser = parse_reading_arg)]
    pub readings: Vec<ReadingArg>,

    /// Number of engines expected to have read the page
    #[arg(long)]
    pub expected: Option<usize>,

    /// Write the consensus text here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the consensus report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Batch mode: directory of <page>.<engine>.txt files
    #[arg(long, conflicts_with = "readings", requires = "output_dir")]
    pub input_dir: Option<PathBuf>,

    /// Batch mode: directory for <page>.txt consensus texts
    #[arg(long, requires = "input_dir")]
    pub output_dir: Option<PathBuf>,

    /// Batch mode: directory for <page>.report.json reports
    #[arg(long, requires = "input_dir")]
    pub report_dir: Option<PathBuf>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    #[arg(long)]
    pub resource_id: String,

    /// Raw OCR text file of a single engine
    #[arg(long, conflicts_with = "readings")]
    pub raw: Option<PathBuf>,

    /// Engine that produced --raw
    #[arg(long, requires = "raw")]
    pub engine: Option<String>,

    /// Engine readings to resolve into the raw layer, as <engine>=<file>
    #[arg(long = "reading", value_name = "ENGINE=FILE", value_parser = parse_reading_arg)]
    pub readings: Vec<ReadingArg>,

    /// Number of engines expected for --reading
    #[arg(long)]
    pub expected: Option<usize>,

    /// Write the consensus report of --reading here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Detected OCR language
    #[arg(long)]
    pub lang: Option<String>,

    /// Literal transcription file
    #[arg(long)]
    pub literal: Option<PathBuf>,

    /// Overwrite an existing literal transcription
    #[arg(long)]
    pub force_literal: bool,

    #[arg(long)]
    pub transcription_method: Option<String>,

    #[arg(long)]
    pub transcription_notes: Option<String>,

    /// Review status proposed with the literal layer
    #[arg(long)]
    pub literal_review: Option<String>,

    /// Reader-formatted transcription file
    #[arg(long)]
    pub formatted: Option<PathBuf>,

    #[arg(long)]
    pub formatting_method: Option<String>,

    #[arg(long)]
    pub formatting_notes: Option<String>,

    /// Review status proposed with the formatted layer
    #[arg(long)]
    pub formatted_review: Option<String>,

    /// Translation file
    #[arg(long)]
    pub translation: Option<PathBuf>,

    /// Language of --translation
    #[arg(long)]
    pub target_lang: Option<String>,

    /// Pipeline version recorded with the sync
    #[arg(long)]
    pub processing_version: Option<String>,

    /// Print the sync result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
