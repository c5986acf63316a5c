//! Search Session
//!
//! Debounced, sequence-stamped search over a catalog. The current
//! [`SearchState`] is published through a `tokio::sync::watch` channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::query::{ActiveList, Catalog, Debouncer, QueryEngine, SearchOutcome, SearchState};
use crate::records::FieldFilter;
use crate::source::SourceResult;

/// Default debounce delay between the last keystroke and the query
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Default, Clone)]
struct SearchInput {
    text: String,
    filters: Vec<FieldFilter>,
}

impl SearchInput {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.filters.is_empty()
    }
}

/// Current input and the newest sequence number issued for it.
#[derive(Debug, Default)]
struct Issued {
    input: SearchInput,
    latest: u64,
}

#[derive(Debug)]
struct SessionShared {
    engine: QueryEngine,
    catalog: Catalog,
    /// Input is copied and stamped under the same lock, so a higher
    /// sequence number always carries newer input.
    issued: Mutex<Issued>,
    state: watch::Sender<SearchState>,
    queries_run: AtomicU64,
    stale_dropped: AtomicU64,
}

impl SessionShared {
    fn lock_issued(&self) -> MutexGuard<'_, Issued> {
        self.issued.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Takes the next sequence number together with the input it runs on.
    fn issue(&self) -> (u64, SearchInput) {
        let mut issued = self.lock_issued();
        issued.latest += 1;
        (issued.latest, issued.input.clone())
    }

    /// Publishes `outcome` only if no newer operation was issued since `seq`.
    fn publish(&self, seq: u64, outcome: SourceResult<ActiveList>) -> bool {
        let issued = self.lock_issued();
        if seq != issued.latest {
            self.stale_dropped.fetch_add(1, Ordering::SeqCst);
            warn!(seq, latest = issued.latest, "dropping superseded search response");
            return false;
        }

        match outcome {
            Ok(active) => {
                debug!(seq, len = active.len(), filtered = active.is_filtered(), "active list replaced");
                self.state.send_replace(SearchState {
                    seq,
                    active,
                    error: None,
                });
            }
            Err(error) => {
                // Keep showing the previous list alongside the failure.
                self.state.send_modify(|state| {
                    state.seq = seq;
                    state.error = Some(error);
                });
            }
        }
        true
    }

    /// Re-derives the active list from the current input.
    async fn run(&self) -> SourceResult<()> {
        let (seq, input) = self.issue();

        let outcome = self.derive(&input).await;
        let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
        self.publish(seq, outcome);
        result
    }

    async fn derive(&self, input: &SearchInput) -> SourceResult<ActiveList> {
        let snapshot = self.catalog.snapshot().await?;
        if input.is_blank() {
            return Ok(ActiveList::All(snapshot));
        }

        self.queries_run.fetch_add(1, Ordering::SeqCst);
        let outcome =
            self.engine
                .search_with_filters(snapshot.records(), &input.text, &input.filters);
        Ok(match outcome {
            SearchOutcome::NoFilter => ActiveList::All(snapshot),
            SearchOutcome::Matches(results) => ActiveList::Filtered(results),
        })
    }
}

// == Search Session ==
/// Turns raw keystrokes into at most one query per quiet period.
///
/// Every executed operation takes a sequence number; a response is only
/// shown if nothing newer was issued while it was in flight.
#[derive(Debug)]
pub struct SearchSession {
    shared: Arc<SessionShared>,
    debouncer: Debouncer,
}

impl SearchSession {
    pub fn new(catalog: Catalog, engine: QueryEngine, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            shared: Arc::new(SessionShared {
                engine,
                catalog,
                issued: Mutex::new(Issued::default()),
                state,
                queries_run: AtomicU64::new(0),
                stale_dropped: AtomicU64::new(0),
            }),
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Shows the unfiltered collection, loading it if the cache is cold.
    pub async fn load(&mut self) -> SourceResult<()> {
        self.debouncer.cancel();
        self.set_input(|input| *input = SearchInput::default());
        self.shared.run().await
    }

    // == Input ==
    /// Handles a keystroke.
    ///
    /// Blank text cancels any pending query and applies right away: the
    /// full collection, or just the field filters when some are set.
    /// Anything else (re)arms the debounce timer; the query runs with
    /// whatever input is current when it fires.
    pub async fn input(&mut self, raw: &str) -> SourceResult<()> {
        self.set_input(|input| input.text = raw.to_string());

        if raw.trim().is_empty() {
            self.debouncer.cancel();
            return self.shared.run().await;
        }

        let shared = self.shared.clone();
        self.debouncer.schedule(async move {
            if let Err(e) = shared.run().await {
                warn!(error = %e, "debounced search failed");
            }
        });
        Ok(())
    }

    /// Handles the confirm key: runs the current input immediately.
    pub async fn confirm(&mut self) -> SourceResult<()> {
        self.debouncer.cancel();
        self.shared.run().await
    }

    /// Clears the query text and filters.
    pub async fn clear(&mut self) -> SourceResult<()> {
        self.debouncer.cancel();
        self.set_input(|input| *input = SearchInput::default());
        self.shared.run().await
    }

    /// Replaces the field filters and re-runs immediately.
    pub async fn set_filters(&mut self, filters: Vec<FieldFilter>) -> SourceResult<()> {
        self.debouncer.cancel();
        self.set_input(|input| input.filters = filters);
        self.shared.run().await
    }

    /// Re-derives the active list after the collection changed.
    pub async fn refresh(&mut self) -> SourceResult<()> {
        self.confirm().await
    }

    // == Observation ==
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    pub fn query_text(&self) -> String {
        self.current_input().text
    }

    pub fn filters(&self) -> Vec<FieldFilter> {
        self.current_input().filters
    }

    pub fn catalog(&self) -> &Catalog {
        &self.shared.catalog
    }

    pub fn has_pending_query(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Number of filtered queries actually executed.
    pub fn queries_run(&self) -> u64 {
        self.shared.queries_run.load(Ordering::SeqCst)
    }

    /// Number of responses discarded because a newer one was issued.
    pub fn stale_dropped(&self) -> u64 {
        self.shared.stale_dropped.load(Ordering::SeqCst)
    }

    fn current_input(&self) -> SearchInput {
        self.shared.lock_issued().input.clone()
    }

    fn set_input(&self, update: impl FnOnce(&mut SearchInput)) {
        update(&mut self.shared.lock_issued().input);
    }
}

/// Whether a state failed with a network error, which callers may retry.
pub fn is_retryable(state: &SearchState) -> bool {
    matches!(state.error, Some(SourceError::Network(_)))
}
