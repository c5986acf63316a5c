//! Cache Module
//!
//! Time-limited, size-bounded cache with an optional durable mirror.

mod age;
mod clock;
mod entry;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use age::AgeIndex;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Durable key prefix used when none is configured
pub const DEFAULT_NAMESPACE: &str = "recordview:";
