//! Cache Entry Module
//!
//! Defines a single cache entry and its durable-mirror encoding.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored payload with the time it was stored and how long it stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Time the value was stored (Unix milliseconds)
    pub stored_at: u64,
    /// Validity window in milliseconds
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stored at `now_ms` that lives for `ttl`.
    pub fn new(value: V, now_ms: u64, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: now_ms,
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is past its validity window.
    ///
    /// An entry stays valid while `now - stored_at <= ttl`; the boundary
    /// millisecond itself is still valid. A clock that moved backwards
    /// never expires an entry.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at) > self.ttl_ms
    }

    // == Time To Live ==
    /// Remaining validity in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        (self.stored_at + self.ttl_ms).saturating_sub(now_ms)
    }
}
