// src/store/mod.rs
// =============================================================================
// Persistence of the last observed content of every crawled page.
//
// One snapshot per URL, overwritten on each scan. No history, no metadata:
// the file content is exactly the raw HTML we last saw.
//
// Submodules:
// - key: URL -> relative file path (collision-free)
// - fs:  the on-disk implementation, on top of tokio::fs
// =============================================================================

mod fs;
mod key;

pub use fs::FsSnapshotStore;
pub use key::snapshot_key;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot derive a snapshot key from {0}")]
    InvalidKey(String),
}

/// Last-known content per URL.
///
/// Reads and writes for one URL are never issued concurrently by the crawl.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn exists(&self, url: &Url) -> Result<bool, StoreError>;

    async fn read(&self, url: &Url) -> Result<String, StoreError>;

    /// Replaces the snapshot of `url`, creating its container if needed.
    async fn write(&self, url: &Url, content: &str) -> Result<(), StoreError>;

    /// Makes sure the place `url`'s snapshot lives in exists.
    async fn ensure_container(&self, url: &Url) -> Result<(), StoreError>;

    /// The previous snapshot of `url`, if there is one.
    async fn load(&self, url: &Url) -> Result<Option<String>, StoreError> {
        if self.exists(url).await? {
            self.read(url).await.map(Some)
        } else {
            Ok(None)
        }
    }
}
