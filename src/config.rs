//! Configuration Module
//!
//! Loads server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_NAMESPACE;
use crate::render::ViewportConfig;

/// Server configuration parameters.
///
/// Every value can be set through an environment variable; unset or
/// unparseable values fall back to the defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for cached entries
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Key prefix for entries in the durable mirror
    pub cache_namespace: String,
    /// JSON file backing the durable mirror; in-memory when unset
    pub store_path: Option<PathBuf>,
    /// Quiet period before a typed query runs, in milliseconds
    pub search_debounce_ms: u64,
    /// Maximum number of search results
    pub search_limit: usize,
    /// Fixed row height in pixels
    pub item_height: f64,
    /// Initial viewport height in pixels
    pub viewport_height: f64,
    /// Rows rendered above and below the viewport
    pub viewport_buffer: usize,
}

impl Config {
    /// Creates a Config from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `DEFAULT_TTL` - Cache TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 30)
    /// - `CACHE_NAMESPACE` - Durable key prefix (default: `recordview:`)
    /// - `STORE_PATH` - Durable mirror file (default: unset)
    /// - `SEARCH_DEBOUNCE_MS` - Debounce delay (default: 300)
    /// - `SEARCH_LIMIT` - Result ceiling (default: 100)
    /// - `ITEM_HEIGHT` - Row height in pixels (default: 60)
    /// - `VIEWPORT_HEIGHT` - Viewport height in pixels (default: 600)
    /// - `VIEWPORT_BUFFER` - Buffer rows (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("MAX_ENTRIES", defaults.max_entries),
            default_ttl: parse_var("DEFAULT_TTL", defaults.default_ttl),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            cache_namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_namespace),
            store_path: env::var("STORE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            search_debounce_ms: parse_var("SEARCH_DEBOUNCE_MS", defaults.search_debounce_ms),
            search_limit: parse_var("SEARCH_LIMIT", defaults.search_limit),
            item_height: parse_var("ITEM_HEIGHT", defaults.item_height),
            viewport_height: parse_var("VIEWPORT_HEIGHT", defaults.viewport_height),
            viewport_buffer: parse_var("VIEWPORT_BUFFER", defaults.viewport_buffer),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn viewport(&self) -> ViewportConfig {
        ViewportConfig::new(self.item_height, self.viewport_buffer)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            default_ttl: 300,
            server_port: 3000,
            cleanup_interval: 30,
            cache_namespace: DEFAULT_NAMESPACE.to_string(),
            store_path: None,
            search_debounce_ms: 300,
            search_limit: 100,
            item_height: 60.0,
            viewport_height: 600.0,
            viewport_buffer: 5,
        }
    }
}
