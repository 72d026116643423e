//! Filesystem blob store for attached media.
//!
//! Uploads land under a flat directory with generated names and are served
//! back under the configured public base URL. Deletion is best-effort: the
//! moderation pipeline invokes it when a media-bearing item is rejected.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use blockwatch_core::blob::{extension_for, BlobStore};
use blockwatch_core::{Error, Result};

/// Media content types accepted for upload
const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
];

/// Blob store writing media files under a local directory
pub struct FsBlobStore {
    base_dir: PathBuf,
    public_base_url: String,
    max_size: usize,
}

impl FsBlobStore {
    pub async fn new(
        base_dir: PathBuf,
        public_base_url: impl Into<String>,
        max_size: usize,
    ) -> Result<Self> {
        fs::create_dir_all(&base_dir).await.map_err(|e| {
            Error::storage(format!(
                "failed to create media directory '{}': {}",
                base_dir.display(),
                e
            ))
        })?;

        info!(path = %base_dir.display(), "Media store initialized");

        let public_base_url: String = public_base_url.into();
        Ok(Self {
            base_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }

    /// File name referenced by a blob URL, refusing anything that could
    /// escape the media directory.
    fn file_name_of(&self, url: &str) -> Result<String> {
        let name = url.rsplit('/').next().unwrap_or_default();
        if name.is_empty() || name.contains("..") || name.contains('\\') {
            return Err(Error::storage(format!("malformed blob url '{}'", url)));
        }
        Ok(name.to_string())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, data: &[u8], content_type: &str) -> Result<String> {
        if data.is_empty() {
            return Err(Error::storage("empty upload"));
        }
        if data.len() > self.max_size {
            return Err(Error::validation(format!(
                "upload of {} bytes exceeds the {} byte limit",
                data.len(),
                self.max_size
            )));
        }
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(Error::validation(format!(
                "content type '{}' is not allowed",
                content_type
            )));
        }

        let name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        let path = self.base_dir.join(&name);

        fs::write(&path, data)
            .await
            .map_err(|e| Error::storage(format!("failed to write blob {}: {}", name, e)))?;

        debug!(name, size = data.len(), "Stored media blob");
        Ok(format!("{}/{}", self.public_base_url, name))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let name = self.file_name_of(url)?;
        let path = self.base_dir.join(&name);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(name, "Deleted media blob");
                Ok(())
            }
            // Already gone: deletion is best-effort cleanup
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "failed to delete blob {}: {}",
                name, e
            ))),
        }
    }
}
