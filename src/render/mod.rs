// src/render/mod.rs
// =============================================================================
// This module is the boundary to whatever actually loads a page.
//
// The crawl never talks to reqwest or Chrome directly. It asks a Renderer
// for a page handle once per scan, then drives that handle one URL at a time:
// navigate, read the rendered HTML, list the anchors.
//
// Submodules:
// - http: plain HTTP fetches with reqwest (default)
// - headless: a real Chromium tab via chromiumoxide (feature "headless")
//
// Rust concepts:
// - Traits as seams: the walker is generic over "something that renders"
// - async_trait: lets us put async fns in traits and still use Box<dyn ...>
// =============================================================================

mod http;
#[cfg(feature = "headless")]
mod headless;

pub use http::HttpRenderer;
#[cfg(feature = "headless")]
pub use headless::HeadlessRenderer;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Why a page could not be rendered.
///
/// Every variant is a NavigationFailure from the crawl's point of view: the
/// page is skipped and the scan moves on.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Navigation did not settle within the configured timeout
    #[error("navigation timed out")]
    Timeout,
    /// Hostname could not be resolved
    #[error("could not resolve hostname: {0}")]
    Dns(String),
    /// TCP/TLS connection failed
    #[error("connection failed: {0}")]
    Connect(String),
    /// Server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),
    /// The resource is not an HTML document
    #[error("not an HTML document (content-type: {0})")]
    NotHtml(String),
    /// Browser / DevTools protocol failure
    #[error("browser error: {0}")]
    Browser(String),
    /// Content was requested before a successful navigation
    #[error("no page loaded")]
    NothingLoaded,
    #[error("{0}")]
    Other(String),
}

/// Opens page contexts. One renderer lives for the whole process.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh page context (a browser tab, or an HTTP "page").
    async fn new_page(&self) -> Result<Box<dyn PageHandle>, RenderError>;

    /// Releases the rendering session. Called once, at process shutdown.
    async fn shutdown(&self) {}
}

/// A single page context, driven sequentially by one scan.
#[async_trait]
pub trait PageHandle: Send {
    /// Loads `url` and waits until the page is quiescent.
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError>;

    /// URL of the loaded document after redirects.
    async fn current_url(&mut self) -> Option<Url>;

    /// Fully rendered HTML of the loaded document.
    async fn rendered_content(&mut self) -> Result<String, RenderError>;

    /// Every anchor href of the loaded document, in document order.
    async fn query_all_links(&mut self) -> Result<Vec<String>, RenderError>;

    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}
