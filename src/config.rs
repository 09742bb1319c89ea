// src/config.rs
// =============================================================================
// Turns raw command-line values into validated settings.
//
// Everything that could silently produce wrong exclusion behavior is checked
// here, once, before the first scan:
// - every excluded page and selector key must be a well-formed URL
// - every selector must compile
// - the target must have a hostname to confine the crawl to
//
// URLs are stored in the url crate's canonical form, which is exactly the
// form the crawler uses when it looks pages up.
// =============================================================================

use crate::cli::{Cli, RendererKind};
use crate::crawl::without_fragment;
use crate::diff::ExclusionSelector;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid selector '{selector}' for {url}: {reason}")]
    InvalidSelector {
        url: String,
        selector: String,
        reason: String,
    },
    #[error("URL has no hostname: {0}")]
    MissingHost(String),
}

fn parse_url(input: &str) -> Result<Url, ConfigError> {
    Url::parse(input).map_err(|source| ConfigError::InvalidUrl {
        input: input.to_string(),
        source,
    })
}

/// Which pages are never diffed, and which parts of a page are ignored when
/// diffing. Built once at startup, read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct ExclusionConfig {
    pages: BTreeSet<String>,
    selectors: BTreeMap<String, Vec<ExclusionSelector>>,
}

impl ExclusionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes the page at `url` from diffing and saving.
    pub fn exclude_page(&mut self, url: &str) -> Result<(), ConfigError> {
        let url = parse_url(url)?;
        self.pages.insert(url.into());
        Ok(())
    }

    /// Appends `selector` to the exclusion list of `url`.
    pub fn exclude_selector(&mut self, url: &str, selector: &str) -> Result<(), ConfigError> {
        let key = parse_url(url)?.to_string();
        let compiled =
            ExclusionSelector::parse(selector).map_err(|reason| ConfigError::InvalidSelector {
                url: key.clone(),
                selector: selector.to_string(),
                reason,
            })?;

        self.selectors.entry(key).or_default().push(compiled);
        Ok(())
    }

    pub fn is_page_excluded(&self, url: &Url) -> bool {
        self.pages.contains(url.as_str())
    }

    /// Selectors to strip from `url` before diffing, in the order given.
    pub fn selectors_for(&self, url: &Url) -> &[ExclusionSelector] {
        self.selectors
            .get(url.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// "a, b" for logs
    pub fn describe_pages(&self) -> String {
        self.pages.iter().cloned().collect::<Vec<_>>().join(", ")
    }

    /// "url: sel1, sel2; url2: sel3" for logs
    pub fn describe_selectors(&self) -> String {
        self.selectors
            .iter()
            .map(|(url, selectors)| {
                let list: Vec<&str> = selectors.iter().map(ExclusionSelector::as_str).collect();
                format!("{}: {}", url, list.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Everything the program needs to run, validated.
#[derive(Debug)]
pub struct Settings {
    pub target: Url,
    /// Pages on other hostnames are never crawled
    pub hostname: String,
    /// Zero means a single scan
    pub interval: Duration,
    pub exclusions: ExclusionConfig,
    pub save_dir: PathBuf,
    /// None when alerts are only logged
    pub contactor: Option<String>,
    pub navigation_timeout: Duration,
    pub renderer: RendererKind,
    pub user_data_dir: PathBuf,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let target = without_fragment(parse_url(&cli.url)?);
        let hostname = target
            .host_str()
            .ok_or_else(|| ConfigError::MissingHost(cli.url.clone()))?
            .to_string();

        let mut exclusions = ExclusionConfig::new();
        for page in &cli.exclude_pages {
            exclusions.exclude_page(page)?;
        }
        for (url, selector) in cli.selector_pairs() {
            exclusions.exclude_selector(url, selector)?;
        }

        Ok(Self {
            target,
            hostname,
            interval: Duration::from_millis(cli.interval),
            exclusions,
            save_dir: cli.save_dir,
            contactor: (!cli.no_contactor).then_some(cli.contactor),
            navigation_timeout: Duration::from_secs(cli.navigation_timeout),
            renderer: cli.renderer,
            user_data_dir: cli.user_data_dir,
        })
    }

    /// Startup audit of the effective configuration.
    pub fn log_effective(&self) {
        if self.interval.is_zero() {
            tracing::info!("Scraping {} once", self.target);
        } else {
            tracing::info!(
                "Scraping {} every {}ms",
                self.target,
                self.interval.as_millis()
            );
        }
        tracing::info!("Excluded pages: {}", self.exclusions.describe_pages());
        tracing::info!("Excluded selectors: {}", self.exclusions.describe_selectors());
        tracing::debug!(
            save_dir = %self.save_dir.display(),
            contactor = self.contactor.as_deref().unwrap_or("none"),
            renderer = ?self.renderer,
            user_data_dir = %self.user_data_dir.display(),
            navigation_timeout_s = self.navigation_timeout.as_secs(),
            "runtime settings"
        );
    }
}
