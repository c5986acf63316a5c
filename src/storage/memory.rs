//! In-process durable store, optionally bounded by a byte quota.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{DurableStore, StorageResult};
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<BTreeMap<String, String>>,
    /// Maximum total bytes of keys plus blobs, None = unbounded
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes pushing usage past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            blobs: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| StorageError::Io("memory store lock poisoned".to_string()))
    }
}

impl DurableStore for MemoryStore {
    fn put(&self, key: &str, blob: &str) -> StorageResult<()> {
        let mut blobs = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = blobs
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + blob.len() > quota {
                return Err(StorageError::QuotaExceeded(format!(
                    "writing '{}' needs {} bytes, {} of {} in use",
                    key,
                    key.len() + blob.len(),
                    used,
                    quota
                )));
            }
        }

        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .lock()?
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
