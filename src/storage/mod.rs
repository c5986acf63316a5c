//! Durable Storage Module
//!
//! Key-value blob stores backing the cache's persistence mirror.
//!
//! Every operation is fallible. Callers in this crate treat failures as
//! non-fatal; the in-memory cache stays authoritative.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;

/// Result alias for durable store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// == Durable Store ==
/// String-keyed blob store with prefix enumeration.
pub trait DurableStore: Send + Sync + std::fmt::Debug {
    /// Writes `blob` under `key`, replacing any previous blob.
    fn put(&self, key: &str, blob: &str) -> StorageResult<()>;

    /// Reads the blob stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Lists every key starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
