//! Durable store persisted as a single JSON document on disk.
//!
//! The whole map is rewritten on every mutation through a temporary file
//! and a rename, so a crash leaves either the old or the new document.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{DurableStore, StorageResult};
use crate::error::StorageError;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    blobs: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the document at `path`, starting empty if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let blobs = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(format!("{}: {}", path.display(), e))),
        };

        debug!("Opened file store at {} with {} keys", path.display(), blobs.len());
        Ok(Self {
            path,
            blobs: Mutex::new(blobs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_through<F>(&self, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Io("file store lock poisoned".to_string()))?;

        let mut next = blobs.clone();
        mutate(&mut next);

        let text = serde_json::to_string(&next)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text).map_err(|e| StorageError::Io(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StorageError::Io(format!("{}: {}", self.path.display(), e)))?;

        *blobs = next;
        Ok(())
    }
}

impl DurableStore for FileStore {
    fn put(&self, key: &str, blob: &str) -> StorageResult<()> {
        self.write_through(|m| {
            m.insert(key.to_string(), blob.to_string());
        })
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Io("file store lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.write_through(|m| {
            m.remove(key);
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Io("file store lock poisoned".to_string()))?;
        Ok(blobs
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.put("ns:a", "{\"v\":1}").unwrap();
            store.put("ns:b", "2").unwrap();
            store.remove("ns:b").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("ns:a").unwrap(), Some("{\"v\":1}".to_string()));
        assert_eq!(store.get("ns:b").unwrap(), None);
        assert_eq!(store.keys_with_prefix("ns:").unwrap(), vec!["ns:a"]);
    }

    #[test]
    fn test_corrupt_document_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_unwritable_location_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("missing").join("store.json")).unwrap();

        let err = store.put("k", "v").unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(store.get("k").unwrap(), None);
    }
}
