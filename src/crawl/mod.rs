// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Depth-first traversal starting from the target URL
// - Respects same-hostname restriction (doesn't crawl external sites)
// - Every URL is processed at most once per scan, even if it links to itself
// - Each page is diffed against its saved snapshot and the snapshot refreshed
//
// Submodules:
// - frontier: resolves and filters the links found on a page
// - walker:   the traversal itself, plus one full scan
// =============================================================================

mod frontier;
mod walker;

pub use frontier::{discover_links, without_fragment};
pub use walker::Crawler;

use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// URLs already taken up by the current scan, by canonical string.
///
/// Entries are never removed; a new scan starts from a new set.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(url.as_str())
    }

    /// Marks `url` as visited. Returns false if it already was.
    ///
    /// Check and insert are one step, so a URL can only be claimed once.
    pub fn insert(&mut self, url: &Url) -> bool {
        self.urls.insert(url.as_str().to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Aggregate outcome of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub visited: usize,
    pub changed: usize,
    pub elapsed: Duration,
}
