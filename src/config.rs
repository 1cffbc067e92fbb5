use serde::{Deserialize, Serialize};

/// Engine tuning knobs
///
/// The defaults reproduce the classic ranking contract: at most five
/// results, relevance ties inside 1e-6 broken by rating, and a 64-shard
/// accumulator on the parallel path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Maximum number of documents returned by a ranked query
    pub max_results: usize,
    /// Shard count for the concurrent relevance accumulator
    pub relevance_shards: usize,
    /// Two relevances closer than this compare equal and fall back to rating
    pub relevance_epsilon: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            relevance_shards: 64,
            relevance_epsilon: 1e-6,
        }
    }
}
