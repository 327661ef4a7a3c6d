//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::boost::BoostConfig;

/// Configuration for the search engine and its query layer.
///
/// Deserialized from the `[search]` table of the application configuration.
/// Every field has a default, so an empty table yields a working setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Master switch. When disabled, every engine entry point degrades to a
    /// no-op and queries return empty result sets.
    pub enabled: bool,
    /// Result page size for the mixed result list.
    pub results_per_page: usize,
    /// Maximum number of hits fetched from each collection per query.
    ///
    /// When a collection holds more matches than this, the result page is
    /// flagged as truncated instead of fetching everything.
    pub per_collection_limit: usize,
    /// Cap on the similar-topics surface.
    pub max_similar_topics: usize,
    /// Cap on the content-suggestion surface.
    pub max_suggestion_results: usize,
    /// Per-collection boost multipliers, applied at indexing time.
    pub boosts: BoostConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            results_per_page: 20,
            per_collection_limit: 250,
            max_similar_topics: 10,
            max_suggestion_results: 10,
            boosts: BoostConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Default configuration with the recommended boost table.
    pub fn recommended() -> Self {
        Self {
            boosts: BoostConfig::recommended(),
            ..Self::default()
        }
    }
}
