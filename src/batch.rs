//! Batch query dispatch.
//!
//! Runs a batch of ranked queries against one engine, fanning the queries
//! out over rayon workers. Result order follows input order.

use rayon::prelude::*;

use crate::engine::SearchEngine;
use crate::error::Result;
use crate::models::SearchResult;

/// Answer every query in the batch, one result vector per query.
///
/// The first malformed query fails the whole batch.
pub fn process_queries(
    engine: &SearchEngine,
    queries: &[String],
) -> Result<Vec<Vec<SearchResult>>> {
    queries
        .par_iter()
        .map(|raw_query| engine.find_top_documents(raw_query))
        .collect()
}

/// Answer every query in the batch and flatten the results, preserving
/// per-query order.
pub fn process_queries_joined(
    engine: &SearchEngine,
    queries: &[String],
) -> Result<Vec<SearchResult>> {
    Ok(process_queries(engine, queries)?
        .into_iter()
        .flatten()
        .collect())
}
