// src/crawl/frontier.rs
// =============================================================================
// Decides which links found on a page are worth following.
//
// How it works:
// 1. Resolve every href against the page URL (relative -> absolute)
// 2. Drop the #fragment: it names a spot in the same document, which is
//    visited, diffed and saved under the fragment-less URL
// 3. Keep only URLs on the target hostname
// 4. Drop URLs this scan has already taken up
//
// Document order is preserved; it decides the traversal order.
// This never modifies the visited set, the walker does that.
// =============================================================================

use super::VisitedSet;
use url::Url;

/// Returns the same-host, not yet visited links among `hrefs`, resolved
/// against `base`.
///
/// Parameters:
///   hrefs: raw href values in document order
///   base: URL of the page they were found on (after redirects)
///   hostname: the hostname the crawl is confined to
pub fn discover_links(hrefs: &[String], base: &Url, visited: &VisitedSet, hostname: &str) -> Vec<Url> {
    hrefs
        .iter()
        .filter_map(|href| base.join(href).ok())
        .map(without_fragment)
        // mailto:, javascript: and friends have no host and fall out here
        .filter(|url| url.host_str() == Some(hostname))
        .filter(|url| !visited.contains(url))
        .collect()
}

/// The page identity used for visits, exclusions and snapshots.
pub fn without_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
