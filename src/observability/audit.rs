//! Append-only audit trail
//!
//! - Every sync call appends exactly one record
//! - One JSON record per line
//! - File records are synced before `append` returns
//! - No purging or rotation (external concern)

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Field synchronization of one resource
    Sync,
    /// Consensus resolution of one page
    Resolve,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Sync => "SYNC",
            AuditAction::Resolve => "RESOLVE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for AuditAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Audit record outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Every part succeeded
    Success,
    /// Completed, but some parts failed
    Partial,
    /// Nothing was done
    Failed,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::Partial => "PARTIAL",
            AuditOutcome::Failed => "FAILED",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for AuditOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn serialize_ts<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A single audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Unique record ID
    pub id: Uuid,

    /// When the action completed
    #[serde(rename = "ts", serialize_with = "serialize_ts")]
    pub timestamp: DateTime<Utc>,

    pub action: AuditAction,

    /// Resource id or page name
    pub subject: String,

    pub outcome: AuditOutcome,

    /// Structured result of the action
    #[serde(skip_serializing_if = "Value::is_null")]
    pub detail: Value,
}

impl AuditRecord {
    /// Create a new audit record.
    pub fn new(action: AuditAction, subject: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            subject: subject.into(),
            outcome,
            detail: Value::Null,
        }
    }

    /// Attach the structured result
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Serialize to one JSON line (without newline).
    pub fn to_json(&self) -> String {
        // Serializing string keys and a `Value` cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Audit log trait.
///
/// The audit log is append-only and durable.
pub trait AuditLog: Send + Sync {
    /// Append a record. The record is durable when this returns.
    fn append(&self, record: &AuditRecord) -> io::Result<()>;
}

/// File-based audit log.
pub struct FileAuditLog {
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl FileAuditLog {
    /// Open or create an audit log file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for FileAuditLog {
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        let json = record.to_json();
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "audit log lock poisoned"))?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }
}

/// In-memory audit log for testing.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        self.records
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "audit log lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
