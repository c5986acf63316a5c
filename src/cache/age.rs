//! Age Index Module
//!
//! Tracks keys by the time they were stored, for oldest-first eviction.

use std::collections::VecDeque;

// == Age Index ==
/// Orders keys by stored-at timestamp.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently stored
/// - Back = Oldest stored
///
/// Reads do not reorder keys; only storing does.
#[derive(Debug, Default)]
pub struct AgeIndex {
    /// (stored_at, key), descending by stored_at from the front
    order: VecDeque<(u64, String)>,
}

impl AgeIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record ==
    /// Records that `key` was stored at `stored_at`.
    ///
    /// Replaces any previous position of the key. Among equal timestamps the
    /// most recent call counts as newer. Hydrated entries carry older
    /// timestamps and land in the middle of the order.
    pub fn record(&mut self, key: &str, stored_at: u64) {
        self.remove(key);
        let pos = self
            .order
            .iter()
            .position(|(ts, _)| *ts <= stored_at)
            .unwrap_or(self.order.len());
        self.order.insert(pos, (stored_at, key.to_string()));
    }

    // == Remove ==
    /// Removes a key from the index.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|(_, k)| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest-stored key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back().map(|(_, key)| key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
