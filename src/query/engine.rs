//! Query Engine
//!
//! Single-pass substring search over a record collection with a result
//! ceiling.

use serde::Serialize;

use crate::records::{FieldFilter, Record, SearchField};

/// Default result ceiling
pub const DEFAULT_RESULT_LIMIT: usize = 100;

// == Search Results ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Normalized query text that produced these results
    pub query: String,
    /// Matches in collection order, at most `limit` of them
    pub records: Vec<Record>,
    /// Whether the ceiling was reached. The scan stops there, so further
    /// matches may exist; it is set even when none do.
    pub truncated: bool,
    /// Records examined before the scan ended
    pub scanned: usize,
}

impl SearchResults {
    /// Number of matches found, for UI feedback.
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// What a search produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The query was blank and no filters apply: show the whole collection
    NoFilter,
    Matches(SearchResults),
}

// == Query Engine ==
#[derive(Debug, Clone)]
pub struct QueryEngine {
    limit: usize,
    fields: Vec<SearchField>,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_LIMIT)
    }
}

impl QueryEngine {
    /// Searches every text field, stopping at `limit` matches.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            fields: SearchField::ALL.to_vec(),
        }
    }

    /// Restricts free-text matching to `fields`.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = SearchField>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Trims and case-folds raw input.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    pub fn search(&self, collection: &[Record], raw_query: &str) -> SearchOutcome {
        self.search_with_filters(collection, raw_query, &[])
    }

    /// Matches records containing the query in any searched field and
    /// satisfying every filter.
    ///
    /// Matches keep collection order. Scanning stops as soon as the ceiling
    /// is reached and `truncated` reports exactly that, wherever in the
    /// collection the last match sits.
    pub fn search_with_filters(
        &self,
        collection: &[Record],
        raw_query: &str,
        filters: &[FieldFilter],
    ) -> SearchOutcome {
        let query = Self::normalize(raw_query);
        if query.is_empty() && filters.is_empty() {
            return SearchOutcome::NoFilter;
        }

        let mut records = Vec::new();
        let mut scanned = 0;

        for record in collection {
            if records.len() == self.limit {
                break;
            }
            scanned += 1;
            if filters.iter().all(|f| f.matches(record)) && self.matches_text(record, &query) {
                records.push(record.clone());
            }
        }

        let truncated = records.len() == self.limit;
        SearchOutcome::Matches(SearchResults {
            query,
            records,
            truncated,
            scanned,
        })
    }

    fn matches_text(&self, record: &Record, query: &str) -> bool {
        query.is_empty()
            || self
                .fields
                .iter()
                .any(|f| record.display(*f).to_lowercase().contains(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize, name: impl Fn(usize) -> String) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(i.to_string()).with_field(SearchField::Name, name(i)))
            .collect()
    }

    fn matches(outcome: SearchOutcome) -> SearchResults {
        match outcome {
            SearchOutcome::Matches(results) => results,
            SearchOutcome::NoFilter => panic!("expected matches"),
        }
    }

    #[test]
    fn test_blank_query_means_no_filter() {
        let engine = QueryEngine::default();
        let list = records(3, |i| format!("item {}", i));

        assert_eq!(engine.search(&list, ""), SearchOutcome::NoFilter);
        assert_eq!(engine.search(&list, "   "), SearchOutcome::NoFilter);
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let engine = QueryEngine::default();
        let list = vec![
            Record::new("1").with_field(SearchField::Name, "Pump Station"),
            Record::new("2").with_field(SearchField::Notes, "pumped dry"),
            Record::new("3").with_field(SearchField::Name, "Valve"),
        ];

        let results = matches(engine.search(&list, "  PUMP "));

        assert_eq!(results.query, "pump");
        let ids: Vec<&str> = results.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(!results.truncated);
    }

    #[test]
    fn test_ceiling_truncates_and_stops_early() {
        let engine = QueryEngine::new(100);
        let list = records(150, |i| format!("match {}", i));

        let results = matches(engine.search(&list, "match"));

        assert_eq!(results.count(), 100);
        assert!(results.truncated);
        assert_eq!(results.scanned, 100);
        assert_eq!(results.records[99].id, "99");
    }

    #[test]
    fn test_fewer_matches_than_ceiling() {
        let engine = QueryEngine::new(100);
        let list = records(150, |i| if i % 3 == 0 { "hit".into() } else { "miss".into() });

        let results = matches(engine.search(&list, "hit"));

        assert_eq!(results.count(), 50);
        assert!(!results.truncated);
        assert_eq!(results.scanned, 150);
    }

    #[test]
    fn test_reaching_ceiling_is_truncated_wherever_it_ends() {
        let engine = QueryEngine::new(10);

        let at_end = records(10, |_| "hit".into());
        let results = matches(engine.search(&at_end, "hit"));
        assert_eq!(results.count(), 10);
        assert!(results.truncated);

        let with_tail = records(15, |i| if i < 10 { "hit".into() } else { "miss".into() });
        let results = matches(engine.search(&with_tail, "hit"));
        assert_eq!(results.count(), 10);
        assert!(results.truncated);
        assert_eq!(results.scanned, 10);

        let one_short = records(15, |i| if i < 9 { "hit".into() } else { "miss".into() });
        assert!(!matches(engine.search(&one_short, "hit")).truncated);
    }

    #[test]
    fn test_restricted_fields() {
        let engine = QueryEngine::default().with_fields([SearchField::Category]);
        let list = vec![
            Record::new("1").with_field(SearchField::Name, "safety valve"),
            Record::new("2").with_field(SearchField::Category, "Safety"),
        ];

        let results = matches(engine.search(&list, "safety"));
        assert_eq!(results.records.len(), 1);
        assert_eq!(results.records[0].id, "2");
    }

    #[test]
    fn test_filters_without_text() {
        let engine = QueryEngine::default();
        let list = vec![
            Record::new("1").with_field(SearchField::Location, "North"),
            Record::new("2").with_field(SearchField::Location, "South"),
        ];
        let filters = [FieldFilter::new(SearchField::Location, "south")];

        let results = matches(engine.search_with_filters(&list, "", &filters));
        assert_eq!(results.records[0].id, "2");
        assert_eq!(results.count(), 1);
    }

    #[test]
    fn test_missing_fields_do_not_match_text() {
        let engine = QueryEngine::default();
        let list = vec![Record::new("1")];

        let results = matches(engine.search(&list, "a"));
        assert!(results.records.is_empty());
    }
}
