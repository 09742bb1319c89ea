// src/testing.rs
// =============================================================================
// In-memory stand-ins for the renderer, snapshot store and notifier, so the
// crawl and the scheduler can be tested without a network or a disk.
// =============================================================================

use crate::notify::{ChangeEvent, Notifier};
use crate::render::{PageHandle, RenderError, Renderer};
use crate::store::{SnapshotStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// How a fake URL behaves when navigated to.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Page { html: String, links: Vec<String> },
    /// Lands on another URL, which must also be in the site
    Redirect(String),
    /// Navigation fails right away
    Broken,
    /// Navigation never finishes
    Hang,
}

/// A scripted website. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pages: Arc<Mutex<HashMap<String, FakeResponse>>>,
    navigations: Arc<Mutex<Vec<String>>>,
    /// Time every navigation takes
    latency: Arc<Mutex<Duration>>,
    pages_opened: Arc<AtomicUsize>,
    open_now: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
    refuse_pages: Arc<Mutex<bool>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, html: &str, links: &[&str]) -> &Self {
        self.set(
            url,
            FakeResponse::Page {
                html: html.to_string(),
                links: links.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    pub fn set(&self, url: &str, response: FakeResponse) -> &Self {
        let url = Url::parse(url).unwrap().to_string();
        self.pages.lock().unwrap().insert(url, response);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn refuse_new_pages(&self, refuse: bool) {
        *self.refuse_pages.lock().unwrap() = refuse;
    }

    /// Every navigation so far, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }

    /// Highest number of page contexts open at the same time.
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    fn response(&self, url: &str) -> Option<FakeResponse> {
        self.pages.lock().unwrap().get(url).cloned()
    }
}

#[async_trait]
impl Renderer for FakeSite {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>, RenderError> {
        if *self.refuse_pages.lock().unwrap() {
            return Err(RenderError::Browser("browser is gone".to_string()));
        }

        self.pages_opened.fetch_add(1, Ordering::SeqCst);
        let open = self.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(open, Ordering::SeqCst);

        Ok(Box::new(FakePage {
            site: self.clone(),
            loaded: None,
        }))
    }
}

struct FakePage {
    site: FakeSite,
    loaded: Option<(Url, String, Vec<String>)>,
}

impl Drop for FakePage {
    fn drop(&mut self) {
        self.site.open_now.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        self.loaded = None;
        self.site.navigations.lock().unwrap().push(url.to_string());

        let latency = *self.site.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut current = url.clone();
        loop {
            match self.site.response(current.as_str()) {
                Some(FakeResponse::Page { html, links }) => {
                    self.loaded = Some((current, html, links));
                    return Ok(());
                }
                Some(FakeResponse::Redirect(to)) => current = Url::parse(&to).unwrap(),
                Some(FakeResponse::Hang) => {
                    std::future::pending::<()>().await;
                }
                Some(FakeResponse::Broken) => return Err(RenderError::Status(500)),
                None => return Err(RenderError::Status(404)),
            }
        }
    }

    async fn current_url(&mut self) -> Option<Url> {
        self.loaded.as_ref().map(|(url, _, _)| url.clone())
    }

    async fn rendered_content(&mut self) -> Result<String, RenderError> {
        self.loaded
            .as_ref()
            .map(|(_, html, _)| html.clone())
            .ok_or(RenderError::NothingLoaded)
    }

    async fn query_all_links(&mut self) -> Result<Vec<String>, RenderError> {
        self.loaded
            .as_ref()
            .map(|(_, _, links)| links.clone())
            .ok_or(RenderError::NothingLoaded)
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Snapshot store backed by a map, recording every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<String>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, url: &str, content: &str) {
        let url = Url::parse(url).unwrap().to_string();
        self.snapshots
            .lock()
            .unwrap()
            .insert(url, content.to_string());
    }

    pub fn get(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).unwrap().to_string();
        self.snapshots.lock().unwrap().get(&url).cloned()
    }

    /// URLs written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    fn io_error(action: &'static str, url: &Url) -> StoreError {
        StoreError::Io {
            action,
            path: url.as_str().into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn exists(&self, url: &Url) -> Result<bool, StoreError> {
        Ok(self.snapshots.lock().unwrap().contains_key(url.as_str()))
    }

    async fn read(&self, url: &Url) -> Result<String, StoreError> {
        if *self.fail_reads.lock().unwrap() {
            return Err(Self::io_error("read", url));
        }
        self.snapshots
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Self::io_error("read", url))
    }

    async fn write(&self, url: &Url, content: &str) -> Result<(), StoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Self::io_error("write", url));
        }
        self.writes.lock().unwrap().push(url.to_string());
        self.snapshots
            .lock()
            .unwrap()
            .insert(url.to_string(), content.to_string());
        Ok(())
    }

    async fn ensure_container(&self, _url: &Url) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Notifier that remembers every event.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.url.to_string()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: ChangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}
