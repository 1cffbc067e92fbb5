pub mod batch;
pub mod concurrent_map;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod models;
pub mod paginate;
pub mod query;
pub mod request_log;
pub mod tokenizer;

pub use batch::{process_queries, process_queries_joined};
pub use concurrent_map::ShardedMap;
pub use config::EngineSettings;
pub use dedup::remove_duplicates;
pub use engine::SearchEngine;
pub use error::{Result, SearchError};
pub use models::{DocumentId, DocumentStatus, SearchResult};
pub use paginate::{paginate, Paginator};
pub use query::ParsedQuery;
pub use request_log::RequestTracker;
pub use tokenizer::StopWordSet;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
