//! HTML stripping for document bodies.
//!
//! Rendered post and content bodies are stored as HTML; the search index
//! receives plain text. Stripping happens once, at document conversion time.

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").unwrap_or_else(|_| unreachable!()))
}

/// Remove all HTML tags from the given text.
///
/// Tags are replaced by spaces so that adjacent words do not fuse
/// (`<p>a</p><p>b</p>` becomes `a b`, not `ab`), then whitespace is
/// collapsed and the result trimmed.
///
/// # Examples
///
/// ```
/// use agora_core::util::html::strip_html;
///
/// assert_eq!(strip_html("<p>hello <b>world</b></p>"), "hello world");
/// assert_eq!(strip_html(""), "");
/// ```
pub fn strip_html(text: &str) -> String {
    let without_tags = tag_pattern().replace_all(text, " ");
    without_tags
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_simple() {
        assert_eq!(strip_html("<p>hello</p>"), "hello");
    }

    #[test]
    fn test_strip_html_nested_tags() {
        assert_eq!(
            strip_html("<div><p>hello <em>nested</em> world</p></div>"),
            "hello nested world"
        );
    }

    #[test]
    fn test_strip_html_adjacent_blocks_keep_word_boundary() {
        assert_eq!(strip_html("<p>first</p><p>second</p>"), "first second");
    }

    #[test]
    fn test_strip_html_plain_text_unchanged() {
        assert_eq!(strip_html("no tags here"), "no tags here");
    }

    #[test]
    fn test_strip_html_attributes() {
        assert_eq!(
            strip_html(r#"<a href="https://example.org">link</a>"#),
            "link"
        );
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        assert_eq!(strip_html("  a\n\n  <br/>  b  "), "a b");
    }

    #[test]
    fn test_strip_html_empty() {
        assert_eq!(strip_html(""), "");
        assert_eq!(strip_html("<br/>"), "");
    }
}
