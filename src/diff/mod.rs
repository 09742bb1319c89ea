// src/diff/mod.rs
// =============================================================================
// This module decides whether a page *meaningfully* changed.
//
// Two snapshots of the same page are compared in three steps:
// 1. Identical text? Then nothing changed, no parsing needed.
// 2. Parse both into DOM trees and cut out every subtree matching one of the
//    page's exclusion selectors (ads, timestamps, inline scripts, ...).
// 3. Serialize both trees again and compare the results.
//
// Submodules:
// - html: parsing, selector stripping and serialization with `scraper`
// =============================================================================

mod html;

pub use html::{normalize, ExclusionSelector};

/// Returns true when `new_raw` differs from `old_raw` once every subtree
/// matching `exclusions` has been removed from both documents.
///
/// A selector that matches nothing is a no-op.
pub fn has_changed(old_raw: &str, new_raw: &str, exclusions: &[ExclusionSelector]) -> bool {
    // Cheap path: verbatim equal content never needs a parse
    if old_raw == new_raw {
        return false;
    }

    normalize(old_raw, exclusions) != normalize(new_raw, exclusions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(patterns: &[&str]) -> Vec<ExclusionSelector> {
        patterns
            .iter()
            .map(|p| ExclusionSelector::parse(p).unwrap())
            .collect()
    }

    #[test]
    fn test_identical_content_is_unchanged() {
        let html = "<div>A</div>";
        assert!(!has_changed(html, html, &[]));
    }

    #[test]
    fn test_text_change_is_detected() {
        assert!(has_changed("<div>A</div>", "<div>B</div>", &[]));
    }

    #[test]
    fn test_excluded_script_change_is_ignored() {
        let old = "<div>A<script>x</script></div>";
        let new = "<div>A<script>y</script></div>";

        assert!(has_changed(old, new, &[]));
        assert!(!has_changed(old, new, &selectors(&["script"])));
    }

    #[test]
    fn test_change_outside_excluded_region_is_detected() {
        let old = "<div>A<span class=\"clock\">10:00</span></div>";
        let new = "<div>B<span class=\"clock\">10:05</span></div>";
        assert!(has_changed(old, new, &selectors(&[".clock"])));
    }

    #[test]
    fn test_selector_matching_nothing_is_a_noop() {
        let old = "<div>A</div>";
        let new = "<div>B</div>";
        assert!(has_changed(old, new, &selectors(&[".does-not-exist"])));
    }

    #[test]
    fn test_selector_order_does_not_matter() {
        let old = r#"<div><p class="ad">one</p><div id="ts"><p class="ad">1</p></div>X</div>"#;
        let new = r#"<div><p class="ad">two</p><div id="ts"><p class="ad">2</p></div>X</div>"#;

        let forward = has_changed(old, new, &selectors(&[".ad", "#ts"]));
        let backward = has_changed(old, new, &selectors(&["#ts", ".ad"]));
        assert_eq!(forward, backward);
        assert!(!forward);
    }

    #[test]
    fn test_child_combinator_exclusion() {
        let old = "<html><head><script>var t = 1;</script></head><body><h1>Hi</h1></body></html>";
        let new = "<html><head><script>var t = 2;</script></head><body><h1>Hi</h1></body></html>";
        assert!(!has_changed(old, new, &selectors(&["head > script"])));
    }
}
