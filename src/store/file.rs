//! # JSON File Field Store
//!
//! One JSON object per resource at `<root>/<resource_id>.json`, mapping
//! field ids to values. Writes go through a temporary file and a rename so a
//! crash never leaves a half-written record behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::port::FieldStore;

/// Local filesystem field store
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resource ids become file names, so they are restricted to
    /// ASCII alphanumerics, `-`, `_` and `.` (not leading).
    pub fn check_resource_id(resource_id: &str) -> StoreResult<()> {
        let valid = !resource_id.is_empty()
            && !resource_id.starts_with('.')
            && resource_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(())
        } else {
            Err(StoreError::InvalidResource(resource_id.to_string()))
        }
    }

    fn record_path(&self, resource_id: &str) -> StoreResult<PathBuf> {
        Self::check_resource_id(resource_id)?;
        Ok(self.root.join(format!("{}.json", resource_id)))
    }

    /// All fields stored for a resource; empty when the resource has no record.
    pub fn read_record(&self, resource_id: &str) -> StoreResult<BTreeMap<String, String>> {
        let path = self.record_path(resource_id)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::io(resource_id, e.to_string())),
        };

        serde_json::from_str(&content).map_err(|e| StoreError::corrupt(resource_id, e.to_string()))
    }

    fn write_record(
        &self,
        resource_id: &str,
        record: &BTreeMap<String, String>,
    ) -> StoreResult<()> {
        let path = self.record_path(resource_id)?;
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io(resource_id, e.to_string()))?;

        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::corrupt(resource_id, e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        let mut file =
            fs::File::create(&tmp).map_err(|e| StoreError::io(resource_id, e.to_string()))?;
        file.write_all(&body)
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(resource_id, e.to_string()))?;

        fs::rename(&tmp, &path).map_err(|e| StoreError::io(resource_id, e.to_string()))
    }
}

impl FieldStore for JsonFileStore {
    fn get(&self, resource_id: &str, field_id: &str) -> StoreResult<Option<String>> {
        Ok(self.read_record(resource_id)?.remove(field_id))
    }

    fn set(&self, resource_id: &str, field_id: &str, value: &str) -> StoreResult<()> {
        let mut record = self.read_record(resource_id)?;
        record.insert(field_id.to_string(), value.to_string());
        self.write_record(resource_id, &record)
    }
}
