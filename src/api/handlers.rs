//! API Handlers
//!
//! HTTP request handlers for each record view endpoint.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::api::{AppState, RecordView};
use crate::error::{AppError, Result};
use crate::models::{
    DeleteResponse, HealthResponse, RecordFilterParams, RecordResponse, RecordsResponse,
    SearchRequest, SearchResponse, StatsResponse, ViewportRequest, ViewportResponse,
};
use crate::records::RecordPatch;

use super::state::DEFAULT_COLLECTION;

// == Records ==
/// Handler for GET /records
///
/// Without parameters returns the active list. Field parameters fetch the
/// matching records through the cache instead.
pub async fn list_records_handler(
    State(state): State<AppState>,
    Query(params): Query<RecordFilterParams>,
) -> Result<Json<RecordsResponse>> {
    let filters = params.filters();
    if !filters.is_empty() {
        let snapshot = state.catalog.filtered(&filters).await?;
        return Ok(Json(RecordsResponse::new(snapshot.to_vec(), true, false)));
    }

    let search = state.session.lock().await.state();
    Ok(Json(RecordsResponse::new(
        search.active.records().to_vec(),
        search.active.is_filtered(),
        search.active.truncated(),
    )))
}

/// Handler for POST /records
pub async fn create_record_handler(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    let record = state.source.insert(DEFAULT_COLLECTION, &payload).await?;
    state.refresh().await?;

    Ok((StatusCode::CREATED, Json(RecordResponse::created(record))))
}

/// Handler for PATCH /records/:id
pub async fn update_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<RecordPatch>,
) -> Result<Json<RecordResponse>> {
    if patch.is_empty() {
        return Err(AppError::InvalidRequest(
            "Patch must change at least one field".to_string(),
        ));
    }

    let record = state.source.update(DEFAULT_COLLECTION, &id, &patch).await?;
    state.refresh().await?;

    Ok(Json(RecordResponse::updated(record)))
}

/// Handler for DELETE /records/:id
pub async fn delete_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.source.remove(DEFAULT_COLLECTION, &id).await?;
    state.refresh().await?;

    Ok(Json(DeleteResponse::new(id)))
}

// == Search ==
/// Handler for PUT /search
///
/// Feeds the query through the debounce timer, or runs it right away when
/// `confirm` is set. Blank queries always apply immediately.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let response = {
        let mut session = state.session.lock().await;
        if let Some(filters) = req.filters {
            session.set_filters(filters).await?;
        }
        session.input(&req.query).await?;
        if req.confirm {
            session.confirm().await?;
        }
        SearchResponse::new(session.query_text(), session.has_pending_query(), &session.state())
    };

    state.sync_view().await;
    Ok(Json(response))
}

/// Handler for GET /search
pub async fn search_status_handler(State(state): State<AppState>) -> Json<SearchResponse> {
    let session = state.session.lock().await;
    Json(SearchResponse::new(
        session.query_text(),
        session.has_pending_query(),
        &session.state(),
    ))
}

// == Viewport ==
/// Handler for GET /viewport
pub async fn viewport_handler(State(state): State<AppState>) -> Json<ViewportResponse> {
    let view = state.view.lock().await;
    Json(viewport_response(&view))
}

/// Handler for PUT /viewport
///
/// Delivers resize and scroll input to the surface, then lets the renderer
/// react to it the way it would to native events.
pub async fn update_viewport_handler(
    State(state): State<AppState>,
    Json(req): Json<ViewportRequest>,
) -> Result<Json<ViewportResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let mut view = state.view.lock().await;
    let renderer = view.renderer_mut();

    if let Some(height) = req.container_height {
        renderer.surface_mut().resize_viewport(height);
        renderer.on_resize();
    }
    if let Some(top) = req.scroll_top {
        renderer.surface_mut().scroll_to(top);
        renderer.on_scroll();
    }
    if let Some(index) = req.scroll_to_index {
        if index >= renderer.len() {
            return Err(AppError::InvalidRequest(format!(
                "Index {} is outside a list of {} records",
                index,
                renderer.len()
            )));
        }
        renderer.scroll_to_index(index);
        renderer.on_scroll();
    }

    Ok(Json(viewport_response(&view)))
}

fn viewport_response(view: &RecordView) -> ViewportResponse {
    let renderer = view.renderer();
    ViewportResponse {
        phase: renderer.phase(),
        state: renderer.state(),
        rows: renderer.surface().nodes().values().cloned().collect(),
    }
}

// == Service ==
/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.catalog.cache().stats().await;
    let session = state.session.lock().await;

    Json(StatsResponse::new(
        cache,
        session.queries_run(),
        session.stale_dropped(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::config::Config;
    use crate::records::{Record, SearchField};
    use crate::render::VisibleRange;
    use crate::source::MemorySource;
    use crate::storage::MemoryStore;

    async fn test_state(count: usize) -> AppState {
        let source = Arc::new(MemorySource::new());
        let records = (0..count)
            .map(|i| Record::new(i.to_string()).with_field(SearchField::Name, format!("bird {}", i)))
            .collect();
        source.seed(DEFAULT_COLLECTION, records).await;

        let state = AppState::new(&Config::default(), Arc::new(MemoryStore::new()), source).unwrap();
        state.session.lock().await.load().await.unwrap();
        state.sync_view().await;
        state
    }

    #[tokio::test]
    async fn test_list_records_returns_active_list() {
        let state = test_state(3).await;

        let response = list_records_handler(State(state), Query(RecordFilterParams::default()))
            .await
            .unwrap();
        assert_eq!(response.count, 3);
        assert!(!response.filtered);
    }

    #[tokio::test]
    async fn test_list_records_with_filter() {
        let state = test_state(3).await;
        let params = RecordFilterParams {
            name: Some("BIRD 1".to_string()),
            ..Default::default()
        };

        let response = list_records_handler(State(state), Query(params)).await.unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.records[0].id, "1");
    }

    #[tokio::test]
    async fn test_create_record_refreshes_view() {
        let state = test_state(2).await;

        let (status, response) = create_record_handler(
            State(state.clone()),
            Json(json!({ "id": "new", "name": "Kestrel" })),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.record.id, "new");
        assert_eq!(state.view.lock().await.renderer().len(), 3);
    }

    #[tokio::test]
    async fn test_create_invalid_record() {
        let state = test_state(0).await;

        let result = create_record_handler(State(state), Json(json!({ "name": "no id" }))).await;
        assert!(matches!(result, Err(AppError::Source(_))));
    }

    #[tokio::test]
    async fn test_update_with_empty_patch() {
        let state = test_state(1).await;

        let result = update_record_handler(
            State(state),
            Path("0".to_string()),
            Json(RecordPatch::default()),
        )
        .await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_record() {
        let state = test_state(1).await;

        let result = delete_record_handler(State(state), Path("nope".to_string())).await;
        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn test_confirmed_search_updates_view() {
        let state = test_state(20).await;
        let req = SearchRequest {
            query: "bird 1".to_string(),
            confirm: true,
            filters: None,
        };

        let response = search_handler(State(state.clone()), Json(req)).await.unwrap();

        // "bird 1" and "bird 10" through "bird 19"
        assert_eq!(response.count, 11);
        assert!(response.filtered);
        assert!(!response.pending);
        assert_eq!(state.view.lock().await.renderer().len(), 11);
    }

    #[tokio::test]
    async fn test_unconfirmed_search_is_pending() {
        let state = test_state(5).await;
        let req = SearchRequest {
            query: "bird".to_string(),
            ..Default::default()
        };

        let response = search_handler(State(state), Json(req)).await.unwrap();
        assert!(response.pending);
        assert!(!response.filtered);
    }

    #[tokio::test]
    async fn test_viewport_scroll() {
        let state = test_state(1000).await;
        let req = ViewportRequest {
            scroll_top: Some(1200.0),
            ..Default::default()
        };

        let response = update_viewport_handler(State(state), Json(req)).await.unwrap();
        assert_eq!(response.state.range, Some(VisibleRange { start: 15, end: 35 }));
        assert_eq!(response.rows.len(), 21);
        assert_eq!(response.rows[0]["id"], "15");
    }

    #[tokio::test]
    async fn test_viewport_scroll_to_index_out_of_range() {
        let state = test_state(10).await;
        let req = ViewportRequest {
            scroll_to_index: Some(10),
            ..Default::default()
        };

        let result = update_viewport_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state(1).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.cache.misses, 1);
        assert_eq!(response.cache.total_entries, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
