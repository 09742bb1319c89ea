// src/render/http.rs
// =============================================================================
// The default renderer: fetch each page with a plain HTTP GET.
//
// Key functionality:
// - One reqwest Client for the whole process (connection pooling)
// - Follows redirects and remembers where we ended up
// - Rejects non-2xx answers and anything that isn't HTML
// - Maps reqwest's errors onto RenderError so the crawl can log them
//
// No JavaScript runs here, so "rendered content" is the server's HTML.
// Build with --features headless to get a real browser instead.
// =============================================================================

use super::{PageHandle, RenderError, Renderer};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Renders pages by downloading them.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Creates the shared HTTP client.
    ///
    /// `timeout` bounds every request, mirroring the navigation timeout.
    pub fn new(timeout: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("site-watchdog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RenderError::Other(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>, RenderError> {
        // Client is cheap to clone (it's just a reference counter internally)
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            loaded: None,
        }))
    }
}

// What the last successful navigation left behind
struct LoadedPage {
    url: Url,
    html: String,
}

struct HttpPage {
    client: Client,
    loaded: Option<LoadedPage>,
}

#[async_trait]
impl PageHandle for HttpPage {
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        // A failed navigation leaves no page behind
        self.loaded = None;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_html(&content_type) {
            return Err(RenderError::NotHtml(content_type));
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(categorize_error)?;

        self.loaded = Some(LoadedPage {
            url: final_url,
            html,
        });
        Ok(())
    }

    async fn current_url(&mut self) -> Option<Url> {
        self.loaded.as_ref().map(|page| page.url.clone())
    }

    async fn rendered_content(&mut self) -> Result<String, RenderError> {
        self.loaded
            .as_ref()
            .map(|page| page.html.clone())
            .ok_or(RenderError::NothingLoaded)
    }

    async fn query_all_links(&mut self) -> Result<Vec<String>, RenderError> {
        let page = self.loaded.as_ref().ok_or(RenderError::NothingLoaded)?;
        extract_hrefs(&page.html)
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        Ok(())
    }
}

// An empty content-type is given the benefit of the doubt
fn is_html(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    mime.is_empty()
        || mime.eq_ignore_ascii_case("text/html")
        || mime.eq_ignore_ascii_case("application/xhtml+xml")
}

// Collects the raw href of every <a>, in document order.
// Resolution against the page URL is the frontier's job.
fn extract_hrefs(html: &str) -> Result<Vec<String>, RenderError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").map_err(|e| RenderError::Other(e.to_string()))?;

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect())
}

// Categorizes the different reqwest failures.
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - Too many redirects
// - etc.
fn categorize_error(error: reqwest::Error) -> RenderError {
    let error_string = error.to_string();

    if error.is_timeout() {
        RenderError::Timeout
    } else if error.is_redirect() {
        RenderError::Other("too many redirects".to_string())
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            RenderError::Dns(error_string)
        } else {
            RenderError::Connect(error_string)
        }
    } else {
        RenderError::Other(error_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hrefs_in_document_order() {
        let html = r#"
            <a href="/b">B</a>
            <p><a href="https://other.com/">Other</a></p>
            <a name="no-href">Anchor</a>
            <a href="a.html">A</a>
        "#;
        let hrefs = extract_hrefs(html).unwrap();
        assert_eq!(hrefs, vec!["/b", "https://other.com/", "a.html"]);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("TEXT/HTML"));
        assert!(is_html(""));
        assert!(!is_html("application/pdf"));
        assert!(!is_html("image/png"));
    }

    #[tokio::test]
    async fn test_content_before_navigation_is_an_error() {
        let renderer = HttpRenderer::new(Duration::from_secs(1)).unwrap();
        let mut page = renderer.new_page().await.unwrap();

        assert!(page.current_url().await.is_none());
        assert!(matches!(
            page.rendered_content().await,
            Err(RenderError::NothingLoaded)
        ));
        assert!(matches!(
            page.query_all_links().await,
            Err(RenderError::NothingLoaded)
        ));
    }
}
