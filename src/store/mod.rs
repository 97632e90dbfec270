//! # Field Store
//!
//! The narrow read/write port through which the synchronizer reaches the
//! host application's metadata store, plus two local implementations.

pub mod errors;
pub mod file;
pub mod memory;
pub mod port;

pub use errors::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use port::FieldStore;
