//! # In-Memory Field Store
//!
//! Used by tests and dry runs. Supports injecting read or write failures for
//! individual fields.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::errors::{StoreError, StoreResult};
use super::port::FieldStore;

#[derive(Debug, Default)]
struct Inner {
    values: BTreeMap<(String, String), String>,
    failing_reads: BTreeSet<String>,
    failing_writes: BTreeSet<String>,
    writes: u64,
}

/// Field store backed by a map held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write.
    pub fn insert(&self, resource_id: &str, field_id: &str, value: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner
                .values
                .insert((resource_id.to_string(), field_id.to_string()), value.to_string());
        }
    }

    /// Make every subsequent read of `field_id` fail.
    pub fn fail_reads_for(&self, field_id: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing_reads.insert(field_id.to_string());
        }
    }

    /// Make every subsequent write of `field_id` fail.
    pub fn fail_writes_for(&self, field_id: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing_writes.insert(field_id.to_string());
        }
    }

    /// Stored value, bypassing failure injection.
    pub fn value(&self, resource_id: &str, field_id: &str) -> Option<String> {
        self.inner.lock().ok().and_then(|inner| {
            inner
                .values
                .get(&(resource_id.to_string(), field_id.to_string()))
                .cloned()
        })
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> u64 {
        self.inner.lock().map(|inner| inner.writes).unwrap_or(0)
    }

    /// Snapshot of every field stored for a resource.
    pub fn fields_of(&self, resource_id: &str) -> BTreeMap<String, String> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .values
                    .iter()
                    .filter(|((rid, _), _)| rid == resource_id)
                    .map(|((_, fid), v)| (fid.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl FieldStore for MemoryStore {
    fn get(&self, resource_id: &str, field_id: &str) -> StoreResult<Option<String>> {
        let inner = self.lock()?;
        if inner.failing_reads.contains(field_id) {
            return Err(StoreError::io(resource_id, format!("read of field {} failed", field_id)));
        }
        Ok(inner
            .values
            .get(&(resource_id.to_string(), field_id.to_string()))
            .cloned())
    }

    fn set(&self, resource_id: &str, field_id: &str, value: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.failing_writes.contains(field_id) {
            return Err(StoreError::write_rejected(field_id, "injected write failure"));
        }
        inner
            .values
            .insert((resource_id.to_string(), field_id.to_string()), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}
