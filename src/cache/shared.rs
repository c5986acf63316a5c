//! Shared Cache Module
//!
//! Async handle over a `CacheStore`, adding `get_or_load`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::debug;

use crate::cache::{CacheStats, CacheStore};

type LoadGates = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

// == Shared Cache ==
/// Cloneable handle to one cache store.
///
/// Loads for the same key are single-flight: a caller arriving while
/// another caller's loader is running waits for it and then reads the
/// freshly cached value instead of fetching again.
#[derive(Debug)]
pub struct SharedCache<V> {
    store: Arc<RwLock<CacheStore<V>>>,
    gates: LoadGates,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gates: self.gates.clone(),
        }
    }
}

impl<V> SharedCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    pub fn new(store: CacheStore<V>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        self.store.write().await.set(key, value, ttl);
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.purge_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    // == Get Or Load ==
    /// Returns the cached value for `key`, or runs `loader` and caches its
    /// successful result.
    ///
    /// The loader runs at most once per call. Loader errors are returned
    /// unchanged and nothing is cached.
    pub async fn get_or_load<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        loader: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let gate = self.gate(key);

        let result = {
            let _turn = gate.lock().await;

            let cached = self.store.write().await.get(key);
            match cached {
                Some(value) => Ok(value),
                None => {
                    debug!(key, "loading cold cache key");
                    let loaded = loader().await;
                    if let Ok(value) = &loaded {
                        self.store.write().await.set(key, value.clone(), ttl);
                    }
                    loaded
                }
            }
        };

        self.release_gate(key, gate);
        result
    }

    fn gate(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        gates.entry(key.to_string()).or_default().clone()
    }

    fn release_gate(&self, key: &str, gate: Arc<AsyncMutex<()>>) {
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this caller hold it: nobody else is waiting.
        if Arc::strong_count(&gate) == 2 {
            gates.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(300);

    fn shared() -> SharedCache<String> {
        SharedCache::new(CacheStore::new(10, TTL))
    }

    #[tokio::test]
    async fn test_get_or_load_caches_success() {
        let cache = shared();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_load("k", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("loaded".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "loaded");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_failure_is_not_cached() {
        let cache = shared();

        let err = cache
            .get_or_load("k", None, || async { Err::<String, _>("offline") })
            .await
            .unwrap_err();
        assert_eq!(err, "offline");
        assert!(!cache.has("k").await);

        let value = cache
            .get_or_load("k", None, || async { Ok::<_, &str>("second try".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "second try");
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_single_flight() {
        let cache = shared();
        let calls = Arc::new(AtomicUsize::new(0));

        let load = |cache: SharedCache<String>, calls: Arc<AtomicUsize>| async move {
            cache
                .get_or_load("cold", None, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, String>("v".to_string())
                })
                .await
        };

        let (a, b) = tokio::join!(
            load(cache.clone(), calls.clone()),
            load(cache.clone(), calls.clone())
        );

        assert_eq!(a.unwrap(), "v");
        assert_eq!(b.unwrap(), "v");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.gates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_is_visible_immediately() {
        let cache = shared();

        cache.set("k", "v".to_string(), None).await;

        assert_eq!(cache.get("k").await, Some("v".to_string()));
        assert_eq!(cache.len().await, 1);
        assert!(cache.delete("k").await);
        assert_eq!(cache.stats().await.total_entries, 0);
    }
}
