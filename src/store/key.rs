// src/store/key.rs
// =============================================================================
// Turns a URL into a relative file path for its snapshot.
//
// Layout:  <host>[_<port>]/<dir>/<dir>/_<leaf>[~<query>].html
//
// - the root path and any trailing slash map to a fixed "index.html"
// - every segment is percent-escaped, including '.', '_' and '~'
// - escaped names therefore never contain a dot, so a directory can't
//   clash with a file, and only real leaves start with '_'
// - the fragment is not part of the key (same document)
// =============================================================================

use super::StoreError;
use std::borrow::Cow;
use std::path::PathBuf;
use url::Url;

const INDEX_STEM: &str = "index";
const EXTENSION: &str = ".html";

/// Derives the collision-free relative snapshot path of `url`.
pub fn snapshot_key(url: &Url) -> Result<PathBuf, StoreError> {
    let host = url
        .host_str()
        .ok_or_else(|| StoreError::InvalidKey(url.to_string()))?;

    let mut key = PathBuf::from(match url.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    });

    let mut segments: Vec<&str> = url
        .path_segments()
        .ok_or_else(|| StoreError::InvalidKey(url.to_string()))?
        .collect();
    let leaf = segments.pop().unwrap_or("");

    for segment in segments {
        if segment.is_empty() {
            // "/a//b": a lone '%' can't come out of escape()
            key.push("%");
        } else {
            key.push(&*escape(segment));
        }
    }

    let mut file = if leaf.is_empty() {
        INDEX_STEM.to_string()
    } else {
        format!("_{}", escape(leaf))
    };
    if let Some(query) = url.query() {
        file.push('~');
        file.push_str(&escape(query));
    }
    file.push_str(EXTENSION);
    key.push(file);

    Ok(key)
}

// Percent-escape everything but [A-Za-z0-9-]
fn escape(raw: &str) -> Cow<'_, str> {
    let encoded = urlencoding::encode(raw);
    if !encoded.contains(['.', '_', '~']) {
        return encoded;
    }

    Cow::Owned(
        encoded
            .replace('.', "%2E")
            .replace('_', "%5F")
            .replace('~', "%7E"),
    )
}
