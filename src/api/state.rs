//! Application State
//!
//! Wires the cache, the record source, the search session and the viewport
//! renderer together for the HTTP handlers and background tasks.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheStore, SharedCache};
use crate::config::Config;
use crate::error::RenderError;
use crate::query::{Catalog, QueryEngine, SearchSession, SearchState};
use crate::records::{CollectionSnapshot, Record, SearchField};
use crate::render::{HeadlessSurface, ResizeBus, ResizeNotifier, ViewportRenderer};
use crate::source::{MemorySource, SourceResult};
use crate::storage::DurableStore;

/// Collection served by the binary
pub const DEFAULT_COLLECTION: &str = "records";

pub type RecordRenderer = ViewportRenderer<Record, HeadlessSurface<Value>>;

/// One rendered row.
pub fn render_row(record: &Record, index: usize) -> Value {
    let mut row = json!({ "index": index, "id": record.id });
    for field in SearchField::ALL {
        row[field.as_str()] = Value::from(record.display(field));
    }
    row
}

// == Record View ==
/// The renderer plus the sequence number of the search state it shows.
#[derive(Debug)]
pub struct RecordView {
    renderer: RecordRenderer,
    applied_seq: Option<u64>,
}

impl RecordView {
    pub fn new(config: &Config, resize: Arc<dyn ResizeNotifier>) -> Result<Self, RenderError> {
        let renderer = ViewportRenderer::new(
            HeadlessSurface::new(config.viewport_height),
            resize,
            config.viewport(),
            render_row,
        )?;
        Ok(Self {
            renderer,
            applied_seq: None,
        })
    }

    /// Shows the active list of `state` unless it is already shown.
    pub fn apply(&mut self, state: &SearchState) -> bool {
        if self.applied_seq == Some(state.seq) {
            return false;
        }
        self.renderer.set_data(state.active.records().to_vec());
        self.applied_seq = Some(state.seq);
        debug!(seq = state.seq, len = state.active.len(), "view synced to search state");
        true
    }

    pub fn renderer(&self) -> &RecordRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut RecordRenderer {
        &mut self.renderer
    }

    pub fn applied_seq(&self) -> Option<u64> {
        self.applied_seq
    }
}

// == App State ==
/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub source: Arc<MemorySource>,
    pub session: Arc<Mutex<SearchSession>>,
    pub view: Arc<Mutex<RecordView>>,
    pub resize: Arc<ResizeBus>,
}

impl AppState {
    /// Builds the state from configuration over the given durable mirror
    /// and record source.
    pub fn new(
        config: &Config,
        durable: Arc<dyn DurableStore>,
        source: Arc<MemorySource>,
    ) -> Result<Self, RenderError> {
        let store: CacheStore<CollectionSnapshot> =
            CacheStore::new(config.max_entries, config.default_ttl())
                .with_namespace(config.cache_namespace.clone())
                .with_durable(durable);
        let catalog = Catalog::new(SharedCache::new(store), source.clone(), DEFAULT_COLLECTION);

        let session = SearchSession::new(
            catalog.clone(),
            QueryEngine::new(config.search_limit),
            config.search_debounce(),
        );

        let resize = Arc::new(ResizeBus::new());
        let view = RecordView::new(config, resize.clone())?;

        Ok(Self {
            catalog,
            source,
            session: Arc::new(Mutex::new(session)),
            view: Arc::new(Mutex::new(view)),
            resize,
        })
    }

    /// Pushes the session's current state into the view.
    pub async fn sync_view(&self) -> bool {
        let state = self.session.lock().await.state();
        self.view.lock().await.apply(&state)
    }

    /// Reloads the collection after a mutation and re-runs the current
    /// query against it.
    pub async fn refresh(&self) -> SourceResult<()> {
        self.catalog.invalidate().await;
        let result = self.session.lock().await.refresh().await;
        self.sync_view().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    async fn state_with(records: Vec<Record>) -> AppState {
        let source = Arc::new(MemorySource::new());
        source.seed(DEFAULT_COLLECTION, records).await;
        AppState::new(&Config::default(), Arc::new(MemoryStore::new()), source).unwrap()
    }

    #[test]
    fn test_render_row_uses_placeholder() {
        let record = Record::new("7").with_field(SearchField::Name, "Heron");
        let row = render_row(&record, 3);

        assert_eq!(row["index"], 3);
        assert_eq!(row["id"], "7");
        assert_eq!(row["name"], "Heron");
        assert_eq!(row["notes"], "-");
    }

    #[tokio::test]
    async fn test_sync_view_applies_each_state_once() {
        let state = state_with((0..50).map(|i| Record::new(i.to_string())).collect()).await;
        state.session.lock().await.load().await.unwrap();

        assert!(state.sync_view().await);
        assert!(!state.sync_view().await);

        let view = state.view.lock().await;
        assert_eq!(view.renderer().len(), 50);
        assert_eq!(view.renderer().total_height(), 3000.0);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_mutations() {
        let state = state_with(vec![Record::new("a")]).await;
        state.session.lock().await.load().await.unwrap();
        state.sync_view().await;

        state
            .source
            .insert(DEFAULT_COLLECTION, &json!({ "id": "b", "name": "Wren" }))
            .await
            .unwrap();
        tokio_test::assert_ok!(state.refresh().await);

        assert_eq!(state.view.lock().await.renderer().len(), 2);
        assert_eq!(state.resize.listener_count(), 1);
    }
}
