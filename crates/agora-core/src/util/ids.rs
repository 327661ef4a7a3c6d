//! Slug utilities.
//!
//! Provides slug normalization for stable string identifiers. Chapter
//! documents derive their identifier from the parent content slug plus the
//! section slug, so the normalization must be deterministic.

/// Normalize a title to a lowercase kebab-case slug.
///
/// Performs the following transformations:
/// 1. Trims leading/trailing whitespace
/// 2. Converts to lowercase
/// 3. Replaces underscores with hyphens
/// 4. Drops non-alphanumeric characters (other than hyphens)
/// 5. Collapses runs of whitespace into single hyphens
///
/// # Examples
///
/// ```
/// use agora_core::util::ids::slugify;
///
/// assert_eq!(slugify("Getting Started"), "getting-started");
/// assert_eq!(slugify("c_plus_plus basics"), "c-plus-plus-basics");
/// assert_eq!(slugify("  Mixed   Case!  "), "mixed-case");
/// ```
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace('_', " ")
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("-")
}

/// Build the composite identifier of a chapter document.
///
/// Chapter documents are synthetic: they are not stored as their own rows,
/// so their identifier is derived from the parent content slug and the
/// section slug. Re-publishing a content with different sections therefore
/// produces different identifiers, and the stale ones must be removed
/// explicitly.
pub fn chapter_id(parent_slug: &str, section_slug: &str) -> String {
    format!("{parent_slug}__{section_slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // slugify tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_slugify_simple() {
        assert_eq!(slugify("introduction"), "introduction");
    }

    #[test]
    fn test_slugify_with_spaces() {
        assert_eq!(slugify("Getting Started"), "getting-started");
    }

    #[test]
    fn test_slugify_with_underscores() {
        assert_eq!(slugify("voice_leading"), "voice-leading");
    }

    #[test]
    fn test_slugify_drops_punctuation() {
        assert_eq!(slugify("What's new?"), "whats-new");
    }

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("  Mixed   Case  "), "mixed-case");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
    }

    // -------------------------------------------------------------------------
    // chapter_id tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_chapter_id_composite() {
        assert_eq!(chapter_id("my-tutorial", "chapter-one"), "my-tutorial__chapter-one");
    }

    #[test]
    fn test_chapter_id_deterministic() {
        assert_eq!(
            chapter_id("a", "b"),
            chapter_id("a", "b"),
        );
    }
}
