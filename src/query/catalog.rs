//! Catalog: one remote collection bound to the cache.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use crate::cache::SharedCache;
use crate::records::{CollectionSnapshot, FieldFilter};
use crate::source::{CollectionSource, SourceResult};

/// Reads a collection through the cache, loading it from the source only
/// when the cache holds nothing valid.
#[derive(Debug, Clone)]
pub struct Catalog {
    cache: SharedCache<CollectionSnapshot>,
    source: Arc<dyn CollectionSource>,
    collection: String,
    ttl: Option<Duration>,
    /// Cache keys of filtered fetches, dropped together on invalidation
    filtered_keys: Arc<Mutex<HashSet<String>>>,
}

impl Catalog {
    pub fn new(
        cache: SharedCache<CollectionSnapshot>,
        source: Arc<dyn CollectionSource>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            source,
            collection: collection.into(),
            ttl: None,
            filtered_keys: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Caches snapshots for `ttl` instead of the cache's default.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn cache(&self) -> &SharedCache<CollectionSnapshot> {
        &self.cache
    }

    /// Cache key of the full collection.
    pub fn cache_key(&self) -> String {
        format!("collection:{}", self.collection)
    }

    // == Snapshot ==
    /// Full collection, from cache or freshly loaded.
    pub async fn snapshot(&self) -> SourceResult<CollectionSnapshot> {
        let source = self.source.clone();
        let collection = self.collection.clone();
        self.cache
            .get_or_load(&self.cache_key(), self.ttl, || async move {
                let snapshot = source.fetch_all(&collection).await?;
                info!(collection = %collection, count = snapshot.len(), "loaded collection into cache");
                Ok(snapshot)
            })
            .await
    }

    /// Records matching every filter, fetched through the source's own
    /// filtering and cached per filter set.
    pub async fn filtered(&self, filters: &[FieldFilter]) -> SourceResult<CollectionSnapshot> {
        if filters.is_empty() {
            return self.snapshot().await;
        }

        let key = self.filtered_key(filters);
        self.filtered_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone());

        let source = self.source.clone();
        let collection = self.collection.clone();
        let filters = filters.to_vec();
        self.cache
            .get_or_load(&key, self.ttl, || async move {
                source.fetch_filtered(&collection, &filters).await
            })
            .await
    }

    // == Invalidate ==
    /// Drops every cached view of the collection. The next read reloads.
    pub async fn invalidate(&self) {
        let keys: Vec<String> = self
            .filtered_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .collect();

        self.cache.delete(&self.cache_key()).await;
        for key in keys {
            self.cache.delete(&key).await;
        }
        info!(collection = %self.collection, "collection cache invalidated");
    }

    fn filtered_key(&self, filters: &[FieldFilter]) -> String {
        let mut parts: Vec<String> = filters
            .iter()
            .map(|f| format!("{}={}", f.field, f.value.trim().to_lowercase()))
            .collect();
        parts.sort();
        format!("{}?{}", self.cache_key(), parts.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::error::SourceError;
    use crate::records::{Record, SearchField};
    use crate::source::MemorySource;

    async fn catalog_with(records: Vec<Record>) -> (Catalog, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::new());
        source.seed("jobs", records).await;
        let cache = SharedCache::new(CacheStore::new(16, Duration::from_secs(300)));
        (Catalog::new(cache, source.clone(), "jobs"), source)
    }

    #[tokio::test]
    async fn test_snapshot_loads_once() {
        let (catalog, source) = catalog_with(vec![Record::new("a")]).await;

        catalog.snapshot().await.unwrap();
        let snapshot = catalog.snapshot().await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let (catalog, source) = catalog_with(vec![Record::new("a")]).await;
        catalog.snapshot().await.unwrap();

        source.insert("jobs", &serde_json::json!({"id": "b"})).await.unwrap();
        assert_eq!(catalog.snapshot().await.unwrap().len(), 1, "stale until invalidated");

        catalog.invalidate().await;
        assert_eq!(catalog.snapshot().await.unwrap().len(), 2);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let (catalog, source) = catalog_with(vec![]).await;
        source.fail_next(SourceError::PermissionDenied("jobs".to_string()));

        let err = catalog.snapshot().await.unwrap_err();
        assert!(matches!(err, SourceError::PermissionDenied(_)));
        assert!(catalog.snapshot().await.is_ok(), "caller may retry");
    }

    #[tokio::test]
    async fn test_filtered_is_cached_and_invalidated() {
        let (catalog, source) = catalog_with(vec![
            Record::new("1").with_field(SearchField::Category, "Safety"),
            Record::new("2").with_field(SearchField::Category, "Repair"),
        ])
        .await;
        let filters = [FieldFilter::new(SearchField::Category, "safety")];

        assert_eq!(catalog.filtered(&filters).await.unwrap().len(), 1);
        assert_eq!(catalog.filtered(&filters).await.unwrap().len(), 1);
        assert_eq!(source.fetch_count(), 1);

        catalog.invalidate().await;
        assert!(!catalog.cache().has(&catalog.filtered_key(&filters)).await);
    }
}
