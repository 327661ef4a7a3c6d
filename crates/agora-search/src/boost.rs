//! Relevance boost configuration.
//!
//! Boosts are multiplicative weights baked into each document at indexing
//! time, under a reserved `weight` field. The query layer multiplies the
//! backend's textual match score by that weight, so editorial relevance
//! (solved topics, staff-picked contents, useful posts) is decided once per
//! document rather than once per query.
//!
//! Changing the boost table therefore only takes effect on reindexed
//! documents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::DocumentKind;

/// Named boost conditions, keyed per collection in [`BoostConfig`].
pub mod conditions {
    /// Opening post of its topic.
    pub const FIRST_POST: &str = "first_post";
    /// Post with strictly more "useful" than "not useful" votes.
    pub const USEFUL_RATIO: &str = "useful_ratio";
    /// Topic marked solved.
    pub const SOLVED: &str = "solved";
    /// Pinned topic.
    pub const STICKY: &str = "sticky";
    /// Published content of the article kind.
    pub const ARTICLE: &str = "article";
    /// Opinion that was not picked by the staff.
    pub const UNPICKED_OPINION: &str = "unpicked_opinion";
}

/// Per-collection boost multipliers.
///
/// Outer key is the collection name, inner key a condition from
/// [`conditions`]. Unknown or absent entries resolve to a neutral `1.0`,
/// so an empty table disables boosting without disabling search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoostConfig(HashMap<String, HashMap<String, f32>>);

impl BoostConfig {
    /// Empty table; every factor resolves to 1.0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The boost table shipped as the application default.
    pub fn recommended() -> Self {
        let mut config = Self::new();
        config.set(DocumentKind::Topic, conditions::SOLVED, 1.1);
        config.set(DocumentKind::Topic, conditions::STICKY, 1.05);
        config.set(DocumentKind::Post, conditions::FIRST_POST, 1.2);
        config.set(DocumentKind::Post, conditions::USEFUL_RATIO, 1.05);
        config.set(DocumentKind::PublishedContent, conditions::ARTICLE, 2.0);
        config.set(
            DocumentKind::PublishedContent,
            conditions::UNPICKED_OPINION,
            0.5,
        );
        config
    }

    /// Set the multiplier for one condition of one collection.
    pub fn set(&mut self, kind: DocumentKind, condition: &str, factor: f32) {
        self.0
            .entry(kind.collection_name().to_string())
            .or_default()
            .insert(condition.to_string(), factor);
    }

    /// Multiplier for a condition, `1.0` when unconfigured.
    pub fn factor(&self, kind: DocumentKind, condition: &str) -> f32 {
        self.0
            .get(kind.collection_name())
            .and_then(|by_condition| by_condition.get(condition))
            .copied()
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_factor_is_neutral() {
        let config = BoostConfig::new();
        assert_eq!(config.factor(DocumentKind::Topic, conditions::SOLVED), 1.0);
        assert_eq!(config.factor(DocumentKind::Post, "no-such-condition"), 1.0);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = BoostConfig::new();
        config.set(DocumentKind::Topic, conditions::SOLVED, 1.5);
        assert_eq!(config.factor(DocumentKind::Topic, conditions::SOLVED), 1.5);
        // Other collections are untouched.
        assert_eq!(config.factor(DocumentKind::Post, conditions::SOLVED), 1.0);
    }

    #[test]
    fn test_recommended_penalizes_unpicked_opinions() {
        let config = BoostConfig::recommended();
        assert!(
            config.factor(DocumentKind::PublishedContent, conditions::UNPICKED_OPINION) < 1.0
        );
        assert!(config.factor(DocumentKind::PublishedContent, conditions::ARTICLE) > 1.0);
    }

    #[test]
    fn test_deserialize_from_table() {
        let json = r#"{"topic": {"solved": 1.3}}"#;
        let config: BoostConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.factor(DocumentKind::Topic, conditions::SOLVED), 1.3);
    }
}
