//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: purges expired cache entries at the configured interval
//! - View sync: keeps the renderer showing the session's active list

mod cleanup;
mod sync;

pub use cleanup::spawn_cleanup_task;
pub use sync::spawn_view_sync_task;
