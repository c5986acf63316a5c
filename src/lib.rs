//! Recordview - client-side record presentation engine
//!
//! A TTL cache with a durable mirror, debounced search with a result
//! ceiling, and viewport-windowed rendering of large lists.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod records;
pub mod render;
pub mod source;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_view_sync_task};
