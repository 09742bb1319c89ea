// src/crawl/walker.rs
// =============================================================================
// This module walks a website and reports the pages that changed.
//
// How it works:
// 1. Start with the target URL on a stack
// 2. Pop a URL; skip it if this scan already took it up, otherwise mark it
//    visited BEFORE loading it (a failing page is never retried)
// 3. Load the page; a failure just means "no changes, nothing to follow"
// 4. Unless the page is excluded: diff it against its snapshot, alert on a
//    change, then save the new content as the snapshot
// 5. Push the page's same-host, unvisited links (in reverse, so the first
//    link is handled first) and repeat until the stack is empty
//
// The stack reproduces a recursive depth-first walk exactly, without
// growing the call stack on deep sites.
// =============================================================================

use super::{discover_links, ScanResult, VisitedSet};
use crate::config::ExclusionConfig;
use crate::diff;
use crate::notify::{ChangeEvent, Notifier};
use crate::render::{PageHandle, RenderError};
use crate::store::SnapshotStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Everything a scan needs besides the page it drives.
///
/// Shared by every scan of the process; holds no per-scan state.
pub struct Crawler {
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    exclusions: Arc<ExclusionConfig>,
    hostname: String,
    navigation_timeout: Duration,
}

// What processing a single page produced
#[derive(Debug, Default)]
struct PageOutcome {
    changed: bool,
    links: Vec<Url>,
}

impl Crawler {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
        exclusions: Arc<ExclusionConfig>,
        hostname: impl Into<String>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            exclusions,
            hostname: hostname.into(),
            navigation_timeout,
        }
    }

    /// One complete scan from `target`, with a fresh visited set.
    pub async fn scan(&self, page: &mut dyn PageHandle, target: &Url) -> ScanResult {
        let started = Instant::now();
        let mut visited = VisitedSet::new();

        let changed = self.walk(page, target.clone(), &mut visited).await;

        ScanResult {
            visited: visited.len(),
            changed,
            elapsed: started.elapsed(),
        }
    }

    /// Walks everything reachable from `start` that `visited` doesn't
    /// already hold, and returns how many pages changed.
    pub async fn walk(&self, page: &mut dyn PageHandle, start: Url, visited: &mut VisitedSet) -> usize {
        let mut stack = vec![start];
        let mut changed = 0;

        while let Some(url) = stack.pop() {
            // Cycle / duplicate guard
            if !visited.insert(&url) {
                continue;
            }

            let outcome = self.visit(page, &url, visited, changed + 1).await;
            if outcome.changed {
                changed += 1;
            }

            stack.extend(outcome.links.into_iter().rev());
        }

        changed
    }

    // Processes one page. `sequence` is the number its change event gets.
    async fn visit(
        &self,
        page: &mut dyn PageHandle,
        url: &Url,
        visited: &VisitedSet,
        sequence: usize,
    ) -> PageOutcome {
        let content = match self.load(page, url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(url = %url, "skipping page: {}", e);
                return PageOutcome::default();
            }
        };

        let changed = if self.exclusions.is_page_excluded(url) {
            false
        } else {
            self.check_and_save(url, &content, sequence).await
        };

        // Links are resolved against where we actually landed
        let base = page.current_url().await.unwrap_or_else(|| url.clone());
        let links = match page.query_all_links().await {
            Ok(hrefs) => discover_links(&hrefs, &base, visited, &self.hostname),
            Err(e) => {
                tracing::warn!(url = %url, "could not read links: {}", e);
                Vec::new()
            }
        };

        PageOutcome { changed, links }
    }

    async fn load(&self, page: &mut dyn PageHandle, url: &Url) -> Result<String, RenderError> {
        tokio::time::timeout(self.navigation_timeout, page.navigate(url))
            .await
            .map_err(|_| RenderError::Timeout)??;

        page.rendered_content().await
    }

    // Diffs against the stored snapshot, alerts on a change and stores the
    // new raw content. Returns whether a change was reported.
    async fn check_and_save(&self, url: &Url, content: &str, sequence: usize) -> bool {
        let previous = match self.store.load(url).await {
            Ok(previous) => previous,
            Err(e) => {
                // Keep the old baseline rather than overwrite what we couldn't read
                tracing::warn!(url = %url, "cannot load previous snapshot: {}", e);
                return false;
            }
        };

        let changed = match previous {
            Some(previous) => diff::has_changed(&previous, content, self.exclusions.selectors_for(url)),
            // First sighting sets the baseline, it isn't a change
            None => false,
        };

        if changed {
            tracing::warn!(url = %url, "change detected on: {}", url);
            self.notifier.notify(ChangeEvent {
                url: url.clone(),
                sequence,
            });
        }

        if let Err(e) = self.store.write(url, content).await {
            tracing::warn!(url = %url, "cannot save snapshot: {}", e);
        }

        changed
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Vec as a stack instead of recursion?
//    - A recursive async fn needs boxing and grows with the depth of the site
//    - push() / pop() on a Vec gives the same depth-first order for free
//    - We push links in reverse so the first link on the page is popped first
//
// 2. What is &mut dyn PageHandle?
//    - A mutable borrow of "some type implementing PageHandle"
//    - The walker doesn't care whether it's reqwest, Chrome or a test fake
//    - Only one navigation can be in flight, because there's only one &mut
//
// 3. What does the double ? in load() do?
//    - tokio::time::timeout wraps the result: Result<Result<(), RenderError>, Elapsed>
//    - The first ? handles the timeout, the second the navigation error
//
// 4. Why Arc<dyn SnapshotStore>?
//    - The store outlives every scan and is shared by all of them
//    - Arc = shared ownership, dyn = chosen at runtime (disk, or memory in tests)
// -----------------------------------------------------------------------------
