//! Query Module
//!
//! Search over the cached collection: the engine itself, the debounce
//! timer, and the session that decides which list is active.

mod active;
mod catalog;
mod debounce;
mod engine;
mod session;

pub use active::{ActiveList, SearchState};
pub use catalog::Catalog;
pub use debounce::Debouncer;
pub use engine::{QueryEngine, SearchOutcome, SearchResults, DEFAULT_RESULT_LIMIT};
pub use session::{is_retryable, SearchSession, DEFAULT_DEBOUNCE};
