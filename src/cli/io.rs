//! File and stdio handling for CLI
//!
//! - Reports go to stdout (JSON or text), logs go to stderr
//! - Input documents are a single JSON object from stdin or a file
//! - UTF-8 only

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON document from `input`, or from stdin when `None`.
pub fn read_request(input: Option<&Path>) -> CliResult<Value> {
    let content = match input {
        Some(path) => read_text(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };

    if content.trim().is_empty() {
        return Err(CliError::invalid_input("Empty input"));
    }

    Ok(serde_json::from_str(&content)?)
}

/// Read a UTF-8 text file.
pub fn read_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))
}

/// Write a text file, creating parent directories. A trailing newline is
/// added when missing.
pub fn write_text(path: &Path, text: &str) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                CliError::io_error(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }
    let mut body = text.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    fs::write(path, body)
        .map_err(|e| CliError::io_error(format!("Failed to write {}: {}", path.display(), e)))
}

/// Write a value as pretty JSON to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, data)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write plain lines to stdout
pub fn write_lines<I, S>(lines: I) -> CliResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    out.flush()?;

    Ok(())
}
