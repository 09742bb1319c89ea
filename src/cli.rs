// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using Rust
// structs and attributes (the #[...] things).
//
// One wrinkle: `--exclude-selector` takes a PAIR of values, and it is usually
// written as `--exclude-selector=<url> <selector>`. clap only attaches
// one value to `--flag=value`, so `expand_selector_pairs` rewrites that
// spelling into `--exclude-selector <url> <selector>` before parsing.
// =============================================================================

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

const SELECTOR_FLAG: &str = "--exclude-selector";

// This struct represents our entire CLI application
//
// arg_required_else_help: running with no arguments prints usage and exits
// with a failure status
#[derive(Parser, Debug)]
#[command(
    name = "site-watchdog",
    version,
    about = "Crawls a website and raises an alert for every page whose content changed",
    long_about = "site-watchdog crawls every page reachable on one hostname, compares each page \
                  with the copy saved by the previous scan and alerts the contactor about pages \
                  that changed. With --interval it keeps scanning forever.",
    arg_required_else_help = true,
    after_help = "Example: site-watchdog https://www.ethcc.io/ --interval=60000 \
                  --exclude-page=https://www.ethcc.io/ \
                  --exclude-selector=https://www.ethcc.io/ 'head > script'"
)]
pub struct Cli {
    /// Website to watch (e.g., https://example.com)
    ///
    /// Only pages on this URL's hostname are crawled
    pub url: String,

    /// Milliseconds between two scans; 0 scans once and exits
    #[arg(long, default_value_t = 0, value_name = "MILLISECONDS")]
    pub interval: u64,

    /// Never diff or save this page (its links are still followed)
    ///
    /// Repeatable
    #[arg(long = "exclude-page", value_name = "URL")]
    pub exclude_pages: Vec<String>,

    /// Ignore elements matching SELECTOR when diffing URL
    ///
    /// Repeatable; takes two values
    #[arg(
        long = "exclude-selector",
        num_args = 2,
        value_names = ["URL", "SELECTOR"]
    )]
    pub exclude_selectors: Vec<String>,

    /// Folder snapshots are saved in
    #[arg(long, default_value = "Saves", value_name = "PATH")]
    pub save_dir: PathBuf,

    /// Address of the contactor that receives change alerts
    #[arg(long, default_value = "127.0.0.1:8000", value_name = "HOST:PORT")]
    pub contactor: String,

    /// Only log changes, don't connect to a contactor
    #[arg(long)]
    pub no_contactor: bool,

    /// Seconds to wait for a page before giving up on it
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    pub navigation_timeout: u64,

    /// How pages are loaded
    #[arg(long, value_enum, default_value_t = RendererKind::Http)]
    pub renderer: RendererKind,

    /// Browser profile folder (headless renderer only)
    #[arg(long, default_value = "data", value_name = "PATH")]
    pub user_data_dir: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererKind {
    /// Plain HTTP GET, no JavaScript
    Http,
    /// Headless Chromium (needs the "headless" feature)
    Headless,
}

impl Cli {
    /// Parses the process arguments, accepting both selector spellings.
    pub fn parse_args() -> Self {
        Self::parse_from(expand_selector_pairs(std::env::args()))
    }

    /// (url, selector) pairs in the order they were given.
    pub fn selector_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        // num_args = 2 guarantees complete pairs
        self.exclude_selectors
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

/// Splits `--exclude-selector=<url>` into `--exclude-selector <url>` so the
/// selector that follows becomes the pair's second value.
pub fn expand_selector_pairs<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let prefix = format!("{}=", SELECTOR_FLAG);
    let mut expanded = Vec::new();

    for arg in args {
        match arg.strip_prefix(&prefix) {
            Some(url) => {
                expanded.push(SELECTOR_FLAG.to_string());
                expanded.push(url.to_string());
            }
            None => expanded.push(arg),
        }
    }

    expanded
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does num_args = 2 do?
//    - Each --exclude-selector consumes exactly two values
//    - All values land in one flat Vec, so we read them back two at a time
//    - chunks_exact(2) walks a slice in non-overlapping pairs
//
// 2. Why parse_from instead of parse?
//    - parse() reads std::env::args() directly
//    - parse_from() takes any list of strings, so we can rewrite the args
//      first (and feed fake args in tests)
// -----------------------------------------------------------------------------
