// src/render/headless.rs
// =============================================================================
// Headless Chromium renderer (cargo feature "headless").
//
// One browser process is launched for the whole lifetime of the program and
// every scan gets its own tab. The DevTools event handler has to be polled
// continuously, so it runs on its own tokio task.
//
// A navigation is finished when the main frame reports "networkIdle" for
// the document it just loaded, so content fetched after the load event is
// part of the snapshot. The walker's navigation timeout bounds the wait.
// =============================================================================

use super::{PageHandle, RenderError, Renderer};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

const LINKS_SCRIPT: &str = "Array.from(document.querySelectorAll('a[href]'), a => a.href)";

/// Renders pages in a real browser, JavaScript included.
pub struct HeadlessRenderer {
    browser: Mutex<Browser>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl HeadlessRenderer {
    /// Launches Chromium with its profile stored under `user_data_dir`.
    pub async fn launch(user_data_dir: &Path, timeout: Duration) -> Result<Self, RenderError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(user_data_dir)
            .request_timeout(timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(RenderError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!(profile = %user_data_dir.display(), "headless browser launched");

        Ok(Self {
            browser: Mutex::new(browser),
            handler: Mutex::new(Some(handler)),
        })
    }
}

#[async_trait]
impl Renderer for HeadlessRenderer {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>, RenderError> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        Ok(Box::new(HeadlessPage { page }))
    }

    async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!("failed to close browser: {}", e);
        }
        if let Err(e) = browser.wait().await {
            tracing::warn!("failed to wait for the browser to exit: {}", e);
        }

        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
    }
}

struct HeadlessPage {
    page: Page,
}

// Follows the main frame's lifecycle events until the document loaded by the
// latest navigation ("init") reaches "networkIdle".
#[derive(Debug, Default)]
struct IdleWatch {
    main_frame: Option<String>,
    loader: Option<String>,
}

impl IdleWatch {
    fn new(main_frame: Option<String>) -> Self {
        Self {
            main_frame,
            loader: None,
        }
    }

    /// Returns true once the network went idle for the current document.
    fn observe(&mut self, frame_id: &str, loader_id: &str, name: &str) -> bool {
        if self.main_frame.as_deref().is_some_and(|main| main != frame_id) {
            return false;
        }

        match name {
            "init" => {
                self.loader = Some(loader_id.to_string());
                false
            }
            // Without an "init" the event can only belong to this navigation
            "networkIdle" => self.loader.as_deref().map_or(true, |loader| loader == loader_id),
            _ => false,
        }
    }
}

#[async_trait]
impl PageHandle for HeadlessPage {
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        // Subscribe first so no lifecycle event of this navigation is missed
        let mut events = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;
        let main_frame = self
            .page
            .mainframe()
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?
            .map(|frame| frame.inner().clone());

        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        let mut watch = IdleWatch::new(main_frame);
        loop {
            let event = events.next().await.ok_or_else(|| {
                RenderError::Browser("lifecycle events stopped before network idle".to_string())
            })?;
            if watch.observe(event.frame_id.inner(), event.loader_id.inner(), &event.name) {
                break;
            }
        }

        // PDFs, images and the like open in the viewer, not as a document
        let content_type: String = self
            .page
            .evaluate("document.contentType")
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?
            .into_value()
            .map_err(|e| RenderError::Browser(e.to_string()))?;
        if !content_type.contains("html") {
            return Err(RenderError::NotHtml(content_type));
        }

        Ok(())
    }

    async fn current_url(&mut self) -> Option<Url> {
        let url = self.page.url().await.ok().flatten()?;
        Url::parse(&url).ok()
    }

    async fn rendered_content(&mut self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))
    }

    async fn query_all_links(&mut self) -> Result<Vec<String>, RenderError> {
        self.page
            .evaluate(LINKS_SCRIPT)
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?
            .into_value()
            .map_err(|e| RenderError::Browser(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.page
            .close()
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waits_for_network_idle_after_load() {
        let mut watch = IdleWatch::new(Some("main".to_string()));
        assert!(!watch.observe("main", "doc", "init"));
        assert!(!watch.observe("main", "doc", "DOMContentLoaded"));
        assert!(!watch.observe("main", "doc", "load"));
        assert!(!watch.observe("main", "doc", "networkAlmostIdle"));
        assert!(watch.observe("main", "doc", "networkIdle"));
    }

    #[test]
    fn test_idle_of_an_iframe_is_ignored() {
        let mut watch = IdleWatch::new(Some("main".to_string()));
        assert!(!watch.observe("main", "doc", "init"));
        assert!(!watch.observe("ad-frame", "ad", "networkIdle"));
        assert!(watch.observe("main", "doc", "networkIdle"));
    }

    #[test]
    fn test_idle_of_the_previous_document_is_ignored() {
        let mut watch = IdleWatch::new(Some("main".to_string()));
        assert!(!watch.observe("main", "old", "init"));
        assert!(!watch.observe("main", "new", "init"));
        assert!(!watch.observe("main", "old", "networkIdle"));
        assert!(watch.observe("main", "new", "networkIdle"));
    }
}
