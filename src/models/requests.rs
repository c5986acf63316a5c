//! Request DTOs for the record view API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::records::{FieldFilter, SearchField};

/// Longest accepted query text
pub const MAX_QUERY_LEN: usize = 256;

/// Request body for PUT /search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    /// Raw query text as typed
    #[serde(default)]
    pub query: String,
    /// Run immediately instead of waiting for the debounce delay
    #[serde(default)]
    pub confirm: bool,
    /// Replaces the field filters when present
    #[serde(default)]
    pub filters: Option<Vec<FieldFilter>>,
}

impl SearchRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.query.chars().count() > MAX_QUERY_LEN {
            return Some(format!(
                "Query exceeds maximum length of {} characters",
                MAX_QUERY_LEN
            ));
        }
        None
    }
}

/// Request body for PUT /viewport
///
/// Applied in order: container height, scroll offset, scroll to index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewportRequest {
    #[serde(default)]
    pub scroll_top: Option<f64>,
    #[serde(default)]
    pub container_height: Option<f64>,
    #[serde(default)]
    pub scroll_to_index: Option<usize>,
}

impl ViewportRequest {
    pub fn validate(&self) -> Option<String> {
        if self.scroll_top.is_some_and(|top| !top.is_finite()) {
            return Some("scroll_top must be a finite number".to_string());
        }
        if self
            .container_height
            .is_some_and(|h| !h.is_finite() || h < 0.0)
        {
            return Some("container_height must be a non-negative number".to_string());
        }
        None
    }
}

/// Query string for GET /records
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilterParams {
    pub name: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl RecordFilterParams {
    /// One equality filter per non-blank parameter.
    pub fn filters(&self) -> Vec<FieldFilter> {
        SearchField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = match field {
                    SearchField::Name => &self.name,
                    SearchField::Category => &self.category,
                    SearchField::Location => &self.location,
                    SearchField::Notes => &self.notes,
                };
                value
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| FieldFilter::new(field, v))
            })
            .collect()
    }
}
