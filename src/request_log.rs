//! Rolling-window request-rate tracking.
//!
//! Wraps an engine and records the outcome of each ranked query over a
//! sliding window of the most recent requests (one slot per minute of a
//! day), reporting how many of them returned no results.

use std::collections::VecDeque;

use crate::engine::SearchEngine;
use crate::error::Result;
use crate::models::{DocumentId, DocumentStatus, SearchResult};

/// One request slot per minute of a day.
const WINDOW_SIZE: usize = 1440;

struct RequestRecord {
    is_empty: bool,
}

/// Sliding-window tracker over an engine's ranked queries
pub struct RequestTracker<'a> {
    engine: &'a SearchEngine,
    requests: VecDeque<RequestRecord>,
    no_result_requests: usize,
}

impl<'a> RequestTracker<'a> {
    pub fn new(engine: &'a SearchEngine) -> Self {
        Self {
            engine,
            requests: VecDeque::new(),
            no_result_requests: 0,
        }
    }

    /// Run a ranked query with status `Actual` and record its outcome.
    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<SearchResult>> {
        self.add_find_request_with_status(raw_query, DocumentStatus::Actual)
    }

    /// Run a ranked query with the given status and record its outcome.
    pub fn add_find_request_with_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<SearchResult>> {
        let results = self
            .engine
            .find_top_documents_with_status(raw_query, status)?;
        self.record(results.is_empty());
        Ok(results)
    }

    /// Run a ranked query with an arbitrary predicate and record its
    /// outcome.
    pub fn add_find_request_by<P>(
        &mut self,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<SearchResult>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let results = self.engine.find_top_documents_by(raw_query, predicate)?;
        self.record(results.is_empty());
        Ok(results)
    }

    /// Number of requests in the current window that returned no results.
    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    fn record(&mut self, is_empty: bool) {
        if is_empty {
            self.no_result_requests += 1;
        }
        self.requests.push_back(RequestRecord { is_empty });
        if self.requests.len() > WINDOW_SIZE {
            if let Some(evicted) = self.requests.pop_front() {
                if evicted.is_empty {
                    self.no_result_requests -= 1;
                }
            }
        }
    }
}
