// src/diff/html.rs
// =============================================================================
// HTML normalization for diffing.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (built on html5ever, Mozilla's HTML parser)
// - Supports CSS selectors for finding elements
// - Exposes the underlying tree so nodes can be detached
//
// Parsing and re-serializing also smooths over harmless differences in the
// raw markup (attribute quoting, implied tags), so two documents compare
// equal whenever their trees are equal.
// =============================================================================

use scraper::{Html, Selector};
use std::fmt;

/// A compiled exclusion selector, remembering the text it was built from.
#[derive(Clone)]
pub struct ExclusionSelector {
    source: String,
    compiled: Selector,
}

impl ExclusionSelector {
    /// Compiles a CSS selector. The error is the parser's message.
    pub fn parse(source: &str) -> Result<Self, String> {
        let compiled = Selector::parse(source).map_err(|e| e.to_string())?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for ExclusionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExclusionSelector").field(&self.source).finish()
    }
}

impl fmt::Display for ExclusionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses `raw`, strips every subtree matched by `exclusions` and serializes
/// what is left.
pub fn normalize(raw: &str, exclusions: &[ExclusionSelector]) -> String {
    let mut document = Html::parse_document(raw);

    for exclusion in exclusions {
        // Collect ids first: the tree can't be mutated while `select` borrows it.
        // Each selector runs against the tree as left by the previous ones.
        let matched: Vec<_> = document
            .select(&exclusion.compiled)
            .map(|element| element.id())
            .collect();

        for id in matched {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    document.html()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selector_is_rejected() {
        assert!(ExclusionSelector::parse("<<div").is_err());
    }

    #[test]
    fn test_selector_keeps_its_source_text() {
        let selector = ExclusionSelector::parse("head > script").unwrap();
        assert_eq!(selector.as_str(), "head > script");
        assert_eq!(selector.to_string(), "head > script");
    }

    #[test]
    fn test_normalize_removes_matching_subtrees() {
        let exclusions = vec![ExclusionSelector::parse("script").unwrap()];
        let out = normalize("<div>A<script>x</script></div>", &exclusions);

        assert!(out.contains("<div>A</div>"));
        assert!(!out.contains("script"));
    }

    #[test]
    fn test_normalize_removes_nested_matches() {
        let exclusions = vec![ExclusionSelector::parse(".ad").unwrap()];
        let out = normalize(
            r#"<div class="ad"><div class="ad">inner</div></div><p>keep</p>"#,
            &exclusions,
        );

        assert!(!out.contains("inner"));
        assert!(out.contains("<p>keep</p>"));
    }

    #[test]
    fn test_normalize_is_stable_for_equivalent_markup() {
        let a = normalize("<p class='x'>Hi</p>", &[]);
        let b = normalize(r#"<html><head></head><body><p class="x">Hi</p></body></html>"#, &[]);
        assert_eq!(a, b);
    }
}
