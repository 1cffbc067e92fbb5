use serde::{Deserialize, Serialize};

/// Caller-supplied document identifier, unique across live documents.
///
/// Signed so that the negative-id precondition is checkable at the API
/// boundary; only non-negative ids are ever stored.
pub type DocumentId = i32;

/// Lifecycle status attached to a document when it is added
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// Ranked search result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: DocumentId,
    pub relevance: f64,
    pub rating: i32,
}

impl SearchResult {
    pub fn new(id: DocumentId, relevance: f64, rating: i32) -> Self {
        Self {
            id,
            relevance,
            rating,
        }
    }
}
