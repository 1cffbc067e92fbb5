use thiserror::Error;

use crate::models::DocumentId;

/// Main error type for squill operations
///
/// Every variant is a precondition violation at the public API; the engine
/// never retries internally, callers are expected to surface the message
/// and continue.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("document id {0} is negative")]
    NegativeDocumentId(DocumentId),

    #[error("document id {0} is already indexed")]
    DuplicateDocumentId(DocumentId),

    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("word {0:?} contains a control character")]
    InvalidWord(String),

    #[error("stop word {0:?} contains a control character")]
    InvalidStopWord(String),

    #[error("query term {0:?} has no text after the minus sign")]
    EmptyMinusTerm(String),

    #[error("query term {0:?} has more than one leading minus sign")]
    DoubleMinusTerm(String),
}

/// Result type alias for squill operations
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SearchError::DuplicateDocumentId(42);
        assert_eq!(err.to_string(), "document id 42 is already indexed");

        let err = SearchError::EmptyMinusTerm("-".to_string());
        assert_eq!(
            err.to_string(),
            "query term \"-\" has no text after the minus sign"
        );
    }
}
