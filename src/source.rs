//! Remote Collection Source
//!
//! The document store the cache loads from, and an in-process
//! implementation used by the server binary and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SourceError;
use crate::records::{CollectionSnapshot, FieldFilter, Record, RecordPatch};

/// Result alias for source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

// == Collection Source ==
/// Read side of the remote document store.
#[async_trait]
pub trait CollectionSource: Send + Sync + std::fmt::Debug {
    /// Fetches every record of `collection` in stored order.
    async fn fetch_all(&self, collection: &str) -> SourceResult<CollectionSnapshot>;

    /// Fetches the records of `collection` matching every filter.
    ///
    /// Default implementation filters the full fetch locally.
    async fn fetch_filtered(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> SourceResult<CollectionSnapshot> {
        let all = self.fetch_all(collection).await?;
        Ok(all
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect::<Vec<_>>()
            .into())
    }
}

// == Memory Source ==
/// In-process document store with the record mutation API.
///
/// Collections are created on first insert. Latency and one-shot failures
/// can be injected to exercise slow and failing fetches.
#[derive(Debug, Default)]
pub struct MemorySource {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    latency: Option<Duration>,
    fail_next: Mutex<Option<SourceError>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next fetch fail with `error`.
    pub fn fail_next(&self, error: SourceError) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Replaces the contents of `collection`.
    pub async fn seed(&self, collection: &str, records: Vec<Record>) {
        self.collections
            .write()
            .await
            .insert(collection.to_string(), records);
    }

    // == Mutations ==
    /// Validates `payload` and appends it to `collection`.
    pub async fn insert(&self, collection: &str, payload: &Value) -> SourceResult<Record> {
        let record = Record::from_value(payload)?;
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();

        if records.iter().any(|r| r.id == record.id) {
            return Err(SourceError::Conflict(format!(
                "record '{}' already exists in '{}'",
                record.id, collection
            )));
        }

        records.push(record.clone());
        debug!(collection, id = %record.id, "record inserted");
        Ok(record)
    }

    /// Merges `patch` into the record with identifier `id`.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &RecordPatch,
    ) -> SourceResult<Record> {
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| SourceError::NotFound(format!("record '{}' in '{}'", id, collection)))?;

        record.apply(patch);
        debug!(collection, id, "record updated");
        Ok(record.clone())
    }

    /// Removes the record with identifier `id`.
    pub async fn remove(&self, collection: &str, id: &str) -> SourceResult<Record> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| SourceError::NotFound(format!("collection '{}'", collection)))?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| SourceError::NotFound(format!("record '{}' in '{}'", id, collection)))?;

        debug!(collection, id, "record removed");
        Ok(records.remove(pos))
    }

    async fn before_fetch(&self) -> SourceResult<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let injected = self
            .fail_next
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match injected {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CollectionSource for MemorySource {
    async fn fetch_all(&self, collection: &str) -> SourceResult<CollectionSnapshot> {
        self.before_fetch().await?;
        let collections = self.collections.read().await;
        let records = collections.get(collection).cloned().unwrap_or_default();
        debug!(collection, count = records.len(), "fetched collection");
        Ok(CollectionSnapshot::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SearchField;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_fetch_preserve_order() {
        let source = MemorySource::new();

        source.insert("jobs", &json!({"id": "b"})).await.unwrap();
        source.insert("jobs", &json!({"id": "a"})).await.unwrap();

        let all = source.fetch_all("jobs").await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates_and_bad_payloads() {
        let source = MemorySource::new();
        source.insert("jobs", &json!({"id": "a"})).await.unwrap();

        assert!(matches!(
            source.insert("jobs", &json!({"id": "a"})).await,
            Err(SourceError::Conflict(_))
        ));
        assert!(matches!(
            source.insert("jobs", &json!({"name": "no id"})).await,
            Err(SourceError::InvalidRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let source = MemorySource::new();
        source.seed("jobs", vec![Record::new("a"), Record::new("b")]).await;

        let patch = RecordPatch {
            name: Some("Alpha".to_string()),
            ..Default::default()
        };
        let updated = source.update("jobs", "a", &patch).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Alpha"));

        source.remove("jobs", "b").await.unwrap();
        assert!(matches!(
            source.remove("jobs", "b").await,
            Err(SourceError::NotFound(_))
        ));
        assert_eq!(source.fetch_all("jobs").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_filtered_uses_field_filters() {
        let source = MemorySource::new();
        source
            .seed(
                "jobs",
                vec![
                    Record::new("1").with_field(SearchField::Category, "Safety"),
                    Record::new("2").with_field(SearchField::Category, "Repair"),
                    Record::new("3").with_field(SearchField::Category, "safety"),
                ],
            )
            .await;

        let filters = [FieldFilter::new(SearchField::Category, "SAFETY")];
        let hits = source.fetch_filtered("jobs", &filters).await.unwrap();

        let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let source = MemorySource::new();
        source.fail_next(SourceError::Network("timeout".to_string()));

        assert!(source.fetch_all("jobs").await.is_err());
        assert!(source.fetch_all("jobs").await.unwrap().is_empty());
        assert_eq!(source.fetch_count(), 2);
    }
}
