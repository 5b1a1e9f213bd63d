//! Local-disk storage for product images.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domain::{DomainError, ImageStore};

/// URI prefix of stored images. A front proxy serves the directory there.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Writes images into a directory exposed at [`UPLOADS_ROUTE`].
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String, DomainError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(file_name), bytes).await?;
        tracing::debug!(file_name, size = bytes.len(), "stored image");
        Ok(format!("{UPLOADS_ROUTE}/{file_name}"))
    }

    async fn remove(&self, file_name: &str) -> Result<(), DomainError> {
        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
