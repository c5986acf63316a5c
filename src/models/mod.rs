//! Request and Response models for the record view API
//!
//! DTOs used to serialize and deserialize HTTP bodies.

pub mod requests;
pub mod responses;

pub use requests::{RecordFilterParams, SearchRequest, ViewportRequest, MAX_QUERY_LEN};
pub use responses::{
    DeleteResponse, HealthResponse, RecordResponse, RecordsResponse, SearchResponse,
    StatsResponse, ViewportResponse,
};
