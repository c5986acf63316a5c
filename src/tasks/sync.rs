//! View Sync Task
//!
//! Follows the search session's published state and pushes every new
//! active list into the viewport renderer, including results of debounced
//! queries that complete with no request waiting on them.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::RecordView;
use crate::query::SearchState;

/// Spawns the sync task. It ends when the session is dropped.
pub fn spawn_view_sync_task(
    mut updates: watch::Receiver<SearchState>,
    view: Arc<Mutex<RecordView>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting view sync task");

        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if view.lock().await.apply(&state) {
                debug!(seq = state.seq, "view sync applied new active list");
            }
        }

        info!("Search session closed, view sync task exiting");
    })
}
