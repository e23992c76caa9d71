use serde::{Deserialize, Serialize};

/// BM25 saturation (`k1`) and length-normalization (`b`) constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Tunables for query processing and result selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of results returned when the caller does not ask for a count.
    pub top_k: usize,
    /// Upper bound applied to caller-supplied counts.
    pub max_k: usize,
    /// Minimum similarity in [0, 100] for a vocabulary correction to apply.
    pub correction_cutoff: f64,
    /// Synonyms kept per query word.
    pub max_synonyms: usize,
    pub bm25: Bm25Params,
    /// Memoized corrections per generation before the cache is reset.
    pub correction_cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_k: 100,
            correction_cutoff: 80.0,
            max_synonyms: 3,
            bm25: Bm25Params::default(),
            correction_cache_capacity: 4096,
        }
    }
}

impl SearchConfig {
    /// Resolve a requested result count against the configured default and cap.
    pub fn clamp_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.top_k).max(1).min(self.max_k.max(1))
    }
}
