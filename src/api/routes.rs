//! API Routes
//!
//! Configures the Axum router with all record view endpoints.

use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_record_handler, delete_record_handler, health_handler, list_records_handler,
    search_handler, search_status_handler, stats_handler, update_record_handler,
    update_viewport_handler, viewport_handler,
};
use super::AppState;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/records",
            get(list_records_handler).post(create_record_handler),
        )
        .route(
            "/records/:id",
            patch(update_record_handler).delete(delete_record_handler),
        )
        .route("/search", get(search_status_handler).put(search_handler))
        .route("/viewport", get(viewport_handler).put(update_viewport_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
