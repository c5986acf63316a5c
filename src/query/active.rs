//! The list currently designated for display.

use crate::error::SourceError;
use crate::query::SearchResults;
use crate::records::{CollectionSnapshot, Record};

// == Active List ==
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveList {
    /// Unfiltered collection
    All(CollectionSnapshot),
    /// Current search result set
    Filtered(SearchResults),
}

impl Default for ActiveList {
    fn default() -> Self {
        ActiveList::All(CollectionSnapshot::default())
    }
}

impl ActiveList {
    pub fn records(&self) -> &[Record] {
        match self {
            ActiveList::All(snapshot) => snapshot.records(),
            ActiveList::Filtered(results) => &results.records,
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, ActiveList::Filtered(_))
    }

    /// Whether the result ceiling cut the list short.
    pub fn truncated(&self) -> bool {
        match self {
            ActiveList::All(_) => false,
            ActiveList::Filtered(results) => results.truncated,
        }
    }
}

// == Search State ==
/// What a search session currently shows.
///
/// Replaced as a whole on every change; watchers never observe a
/// half-updated list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Sequence number of the operation that produced this state
    pub seq: u64,
    pub active: ActiveList,
    /// Failure of the most recent operation, if it failed
    pub error: Option<SourceError>,
}
