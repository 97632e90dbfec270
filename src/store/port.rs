//! # Field Store Port

use super::errors::StoreResult;

/// Read/write access to the host application's per-resource field values.
///
/// Implementations own persistence, access control and concurrent-writer
/// arbitration. Callers assume a single logical writer per sync call.
pub trait FieldStore: Send + Sync + std::fmt::Debug {
    /// Current value of a field, `None` when the field was never written.
    ///
    /// A stored blank string is returned as-is; callers decide what counts
    /// as empty.
    fn get(&self, resource_id: &str, field_id: &str) -> StoreResult<Option<String>>;

    /// Replace the value of a field.
    fn set(&self, resource_id: &str, field_id: &str, value: &str) -> StoreResult<()>;
}

impl<T: FieldStore + ?Sized> FieldStore for &T {
    fn get(&self, resource_id: &str, field_id: &str) -> StoreResult<Option<String>> {
        (**self).get(resource_id, field_id)
    }

    fn set(&self, resource_id: &str, field_id: &str, value: &str) -> StoreResult<()> {
        (**self).set(resource_id, field_id, value)
    }
}

impl<T: FieldStore + ?Sized> FieldStore for Box<T> {
    fn get(&self, resource_id: &str, field_id: &str) -> StoreResult<Option<String>> {
        (**self).get(resource_id, field_id)
    }

    fn set(&self, resource_id: &str, field_id: &str, value: &str) -> StoreResult<()> {
        (**self).set(resource_id, field_id, value)
    }
}
