//! Cache Store Module
//!
//! Main cache engine: HashMap storage, an age index for eviction, TTL
//! expiry and a best-effort durable mirror.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{AgeIndex, CacheEntry, CacheStats, Clock, SystemClock, DEFAULT_NAMESPACE};
use crate::storage::DurableStore;

// == Cache Store ==
/// Time-limited, size-bounded key-value cache.
///
/// In-memory state is authoritative. The durable mirror only speeds up
/// cold reads after a restart and its failures never reach the caller.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys by stored-at time
    ages: AgeIndex,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of in-memory entries
    max_entries: usize,
    /// TTL applied when `set` is called without one
    default_ttl: Duration,
    /// Prefix for every durable key owned by this cache
    namespace: String,
    durable: Option<Arc<dyn DurableStore>>,
    clock: Arc<dyn Clock>,
}

impl<V> CacheStore<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates an in-memory-only store using the system clock.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl` - TTL for entries stored without an explicit one
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ages: AgeIndex::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
            namespace: DEFAULT_NAMESPACE.to_string(),
            durable: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Mirrors every entry into `durable`.
    pub fn with_durable(mut self, durable: Arc<dyn DurableStore>) -> Self {
        self.durable = Some(durable);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the durable key prefix. `clear` only touches keys under it.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    // == Set ==
    /// Stores a value, replacing any previous entry under the same key.
    ///
    /// If the store then holds more than `max_entries`, expired entries go
    /// first, then the oldest-stored ones. The durable write happens last
    /// and its failure is only logged.
    pub fn set(&mut self, key: &str, value: V, ttl: Option<Duration>) {
        let now = self.clock.now_ms();
        let entry = CacheEntry::new(value, now, ttl.unwrap_or(self.default_ttl));

        self.entries.insert(key.to_string(), entry);
        self.ages.record(key, now);
        self.evict_over_capacity();

        if let Some(entry) = self.entries.get(key) {
            let blob = serde_json::to_string(entry);
            match blob {
                Ok(blob) => self.persist(key, &blob),
                Err(e) => {
                    warn!(key, error = %e, "Cannot serialize cache entry for durable mirror");
                    self.stats.record_storage_failure();
                }
            }
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value if a valid entry exists.
    ///
    /// On an in-memory miss the durable mirror is consulted; a valid durable
    /// entry is hydrated back into memory, an expired or unreadable one is
    /// deleted. Expired entries read as absent everywhere.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                debug!(key, "cache hit");
                return Some(value);
            }
            Some(_) => {
                self.remove_everywhere(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                debug!(key, "cache entry expired");
                return None;
            }
            None => {}
        }

        match self.hydrate(key, now) {
            Some(value) => {
                self.stats.record_hit();
                self.stats.record_hydration();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                None
            }
        }
    }

    // == Has ==
    /// Reports whether `get` would return a value.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes the in-memory and durable copies of `key`.
    ///
    /// Returns whether an in-memory entry existed. Deleting twice is the
    /// same as deleting once.
    pub fn delete(&mut self, key: &str) -> bool {
        let existed = self.entries.contains_key(key);
        self.remove_everywhere(key);
        debug!(key, existed, "cache delete");
        existed
    }

    // == Clear ==
    /// Removes every entry, including durable ones under this namespace.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.ages.clear();
        self.stats.set_total_entries(0);

        let Some(durable) = self.durable.clone() else {
            return;
        };
        match durable.keys_with_prefix(&self.namespace) {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = durable.remove(&key) {
                        warn!(key = %key, error = %e, "Cannot remove durable cache entry");
                        self.stats.record_storage_failure();
                    }
                }
            }
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "Cannot list durable cache entries");
                self.stats.record_storage_failure();
            }
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries, in memory and in the durable mirror.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = self.purge_expired_in_memory(now);

        if let Some(durable) = self.durable.clone() {
            let keys = match durable.keys_with_prefix(&self.namespace) {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(error = %e, "Cannot list durable cache entries");
                    self.stats.record_storage_failure();
                    Vec::new()
                }
            };
            for durable_key in keys {
                let expired = match durable.get(&durable_key) {
                    Ok(Some(blob)) => serde_json::from_str::<CacheEntry<IgnoredAny>>(&blob)
                        .map(|e| e.is_expired(now))
                        .unwrap_or(true),
                    _ => false,
                };
                if expired {
                    if let Err(e) = durable.remove(&durable_key) {
                        warn!(key = %durable_key, error = %e, "Cannot remove durable cache entry");
                        self.stats.record_storage_failure();
                    } else {
                        removed += 1;
                    }
                }
            }
        }

        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Number of in-memory entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // == Internals ==
    fn durable_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn hydrate(&mut self, key: &str, now: u64) -> Option<V> {
        let durable = self.durable.clone()?;
        let durable_key = self.durable_key(key);

        let blob = match durable.get(&durable_key) {
            Ok(blob) => blob?,
            Err(e) => {
                warn!(key, error = %e, "Cannot read durable cache entry");
                self.stats.record_storage_failure();
                return None;
            }
        };

        let entry: CacheEntry<V> = match serde_json::from_str(&blob) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable durable cache entry");
                self.remove_durable(key);
                return None;
            }
        };

        if entry.is_expired(now) {
            self.remove_durable(key);
            self.stats.record_expirations(1);
            debug!(key, "durable cache entry expired");
            return None;
        }

        let value = entry.value.clone();
        let ttl_remaining_ms = entry.ttl_remaining_ms(now);
        // Evict among the other keys before the restored entry goes in.
        self.evict_down_to(self.max_entries.saturating_sub(1));
        if self.max_entries > 0 {
            self.ages.record(key, entry.stored_at);
            self.entries.insert(key.to_string(), entry);
        }
        self.stats.set_total_entries(self.entries.len());
        debug!(key, ttl_remaining_ms, "cache entry hydrated from durable mirror");
        Some(value)
    }

    /// Brings the store back to `max_entries`: expired first, then oldest.
    fn evict_over_capacity(&mut self) {
        self.evict_down_to(self.max_entries);
    }

    /// Shrinks the store to `target` entries: expired first, then oldest.
    fn evict_down_to(&mut self, target: usize) {
        if self.entries.len() <= target {
            return;
        }

        let now = self.clock.now_ms();
        self.purge_expired_in_memory(now);

        while self.entries.len() > target {
            let Some(oldest) = self.ages.pop_oldest() else {
                break;
            };
            self.remove_everywhere(&oldest);
            self.stats.record_eviction();
            debug!(key = %oldest, "evicted oldest cache entry");
        }
    }

    fn purge_expired_in_memory(&mut self, now: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_everywhere(key);
        }

        self.stats.record_expirations(expired.len());
        self.stats.set_total_entries(self.entries.len());
        expired.len()
    }

    fn remove_everywhere(&mut self, key: &str) {
        self.entries.remove(key);
        self.ages.remove(key);
        self.remove_durable(key);
        self.stats.set_total_entries(self.entries.len());
    }

    fn persist(&mut self, key: &str, blob: &str) {
        let Some(durable) = self.durable.clone() else {
            return;
        };
        if let Err(e) = durable.put(&self.durable_key(key), blob) {
            warn!(key, error = %e, "Durable cache write failed, keeping in-memory entry");
            self.stats.record_storage_failure();
        }
    }

    fn remove_durable(&mut self, key: &str) {
        let Some(durable) = self.durable.clone() else {
            return;
        };
        if let Err(e) = durable.remove(&self.durable_key(key)) {
            warn!(key, error = %e, "Cannot remove durable cache entry");
            self.stats.record_storage_failure();
        }
    }
}
