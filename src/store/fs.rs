// src/store/fs.rs
// =============================================================================
// Snapshots on the local filesystem.
//
// <root>/<host>/<path...>.html, see key.rs for the exact naming.
// Writes go to "<file>.tmp" first and are renamed into place, so an
// interrupted write never leaves half a snapshot behind.
// =============================================================================

use super::{snapshot_key, SnapshotStore, StoreError};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    /// The root directory is created lazily, on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `url`'s snapshot.
    pub fn path_for(&self, url: &Url) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(snapshot_key(url)?))
    }
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io {
        action,
        path,
        source,
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn exists(&self, url: &Url) -> Result<bool, StoreError> {
        let path = self.path_for(url)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(io_error("stat", &path))
    }

    async fn read(&self, url: &Url) -> Result<String, StoreError> {
        let path = self.path_for(url)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(io_error("read", &path))
    }

    async fn write(&self, url: &Url, content: &str) -> Result<(), StoreError> {
        self.ensure_container(url).await?;

        let path = self.path_for(url)?;
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        tokio::fs::write(&staging, content)
            .await
            .map_err(io_error("write", &staging))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(io_error("replace", &path))
    }

    async fn ensure_container(&self, url: &Url) -> Result<(), StoreError> {
        let path = self.path_for(url)?;
        match path.parent() {
            Some(dir) => tokio::fs::create_dir_all(dir)
                .await
                .map_err(io_error("create folder", dir)),
            None => Ok(()),
        }
    }
}
