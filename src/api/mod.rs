//! API Module
//!
//! HTTP handlers, routing and shared state for the record view server.
//!
//! # Endpoints
//! - `GET /records`, `POST /records` - Active list and record creation
//! - `PATCH /records/:id`, `DELETE /records/:id` - Record mutation
//! - `GET /search`, `PUT /search` - Debounced search
//! - `GET /viewport`, `PUT /viewport` - Rendered window and scroll input
//! - `GET /stats` - Cache and search statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;
mod state;

pub use handlers::*;
pub use routes::create_router;
pub use state::{render_row, AppState, RecordRenderer, RecordView, DEFAULT_COLLECTION};
