//! Response DTOs for the record view API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::query::SearchState;
use crate::records::Record;
use crate::render::{Phase, ViewportState};

/// Response body for GET /records
#[derive(Debug, Clone, Serialize)]
pub struct RecordsResponse {
    pub count: usize,
    /// Whether a search or filter narrowed the list
    pub filtered: bool,
    /// Whether the result ceiling cut the list short
    pub truncated: bool,
    pub records: Vec<Record>,
}

impl RecordsResponse {
    pub fn new(records: Vec<Record>, filtered: bool, truncated: bool) -> Self {
        Self {
            count: records.len(),
            filtered,
            truncated,
            records,
        }
    }
}

/// Response body for POST /records and PATCH /records/:id
#[derive(Debug, Clone, Serialize)]
pub struct RecordResponse {
    pub message: String,
    pub record: Record,
}

impl RecordResponse {
    pub fn created(record: Record) -> Self {
        Self {
            message: format!("Record '{}' created successfully", record.id),
            record,
        }
    }

    pub fn updated(record: Record) -> Self {
        Self {
            message: format!("Record '{}' updated successfully", record.id),
            record,
        }
    }
}

/// Response body for DELETE /records/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: String,
}

impl DeleteResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Record '{}' deleted successfully", id),
            id,
        }
    }
}

/// Response body for PUT /search and GET /search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Query text as last typed
    pub query: String,
    /// Sequence number of the state being shown
    pub seq: u64,
    /// Whether a debounced query has yet to run
    pub pending: bool,
    pub count: usize,
    pub filtered: bool,
    pub truncated: bool,
    /// Last failure, shown alongside the previous list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn new(query: String, pending: bool, state: &SearchState) -> Self {
        Self {
            query,
            seq: state.seq,
            pending,
            count: state.active.len(),
            filtered: state.active.is_filtered(),
            truncated: state.active.truncated(),
            error: state.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Response body for GET /viewport and PUT /viewport
#[derive(Debug, Clone, Serialize)]
pub struct ViewportResponse {
    pub phase: Phase,
    #[serde(flatten)]
    pub state: ViewportState,
    /// Rendered rows in index order
    pub rows: Vec<Value>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Filtered queries executed
    pub queries_run: u64,
    /// Search responses dropped as superseded
    pub stale_dropped: u64,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, queries_run: u64, stale_dropped: u64) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            queries_run,
            stale_dropped,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ActiveList, SearchResults};
    use crate::error::SourceError;

    #[test]
    fn test_records_response_counts() {
        let resp = RecordsResponse::new(vec![Record::new("a"), Record::new("b")], false, false);
        assert_eq!(resp.count, 2);
    }

    #[test]
    fn test_delete_response_serialize() {
        let json = serde_json::to_string(&DeleteResponse::new("r-9")).unwrap();
        assert!(json.contains("r-9"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_search_response_reports_error() {
        let state = SearchState {
            seq: 4,
            active: ActiveList::Filtered(SearchResults {
                query: "owl".to_string(),
                records: vec![Record::new("1")],
                truncated: true,
                scanned: 10,
            }),
            error: Some(SourceError::Network("offline".to_string())),
        };

        let resp = SearchResponse::new("owl".to_string(), false, &state);
        assert_eq!(resp.seq, 4);
        assert_eq!(resp.count, 1);
        assert!(resp.filtered);
        assert!(resp.truncated);
        assert!(resp.error.unwrap().contains("offline"));
    }

    #[test]
    fn test_stats_response_flattens_cache_stats() {
        let cache = CacheStats {
            hits: 8,
            misses: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(StatsResponse::new(cache, 3, 1)).unwrap();
        assert_eq!(json["hits"], 8);
        assert_eq!(json["queries_run"], 3);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
