// src/schedule.rs
// =============================================================================
// Runs scans: once, or forever on a fixed interval.
//
// The scheduler owns the rendering session for the whole process. Each scan
// opens its own page, starts from an empty visited set and closes the page
// when it's done; snapshots on disk carry over from one scan to the next.
//
// Scans never overlap. Ticks come from tokio's interval timer with the
// "Delay" missed-tick policy: a scan that finishes in time waits for the next
// tick, a scan that overruns is followed immediately by the next one, and
// the rhythm restarts from there.
// =============================================================================

use crate::crawl::{Crawler, ScanResult};
use crate::render::Renderer;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use url::Url;

pub struct Scheduler {
    renderer: Arc<dyn Renderer>,
    crawler: Crawler,
    target: Url,
    interval: Duration,
}

impl Scheduler {
    /// `interval` of zero means a single scan.
    pub fn new(renderer: Arc<dyn Renderer>, crawler: Crawler, target: Url, interval: Duration) -> Self {
        Self {
            renderer,
            crawler,
            target,
            interval,
        }
    }

    /// One scan in its own page context, with its summary logged.
    pub async fn run_once(&self) -> ScanResult {
        let started = Instant::now();
        tracing::info!("Scraping started on: {}", self.target);

        let mut page = match self.renderer.new_page().await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("cannot open a page for {}: {}", self.target, e);
                return ScanResult {
                    elapsed: started.elapsed(),
                    ..ScanResult::default()
                };
            }
        };

        let result = self.crawler.scan(page.as_mut(), &self.target).await;

        if let Err(e) = page.close().await {
            tracing::warn!("failed to close page: {}", e);
        }

        tracing::info!(
            visited = result.visited,
            changed = result.changed,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Scraping finished on: {} in {}ms - {} pages visited / {} pages changed",
            self.target,
            result.elapsed.as_millis(),
            result.visited,
            result.changed
        );

        result
    }

    /// Scans until `shutdown` resolves (or after the first scan when there
    /// is no interval). Shutdown also interrupts a scan in progress.
    ///
    /// Returns the number of scans that ran to completion.
    pub async fn run_forever<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut completed = 0;

        if self.interval.is_zero() {
            tokio::select! {
                _ = &mut shutdown => tracing::info!("shutdown requested, scan interrupted"),
                _ = self.run_once() => completed += 1,
            }
            return completed;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The first tick fires right away
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, scan interrupted");
                    break;
                }
                _ = self.run_once() => completed += 1,
            }
        }

        completed
    }
}
