//! Blob-store boundary for attached media.
//!
//! The store is an external collaborator: the pipeline only consumes the
//! returned URL as an opaque string and triggers `delete` as best-effort
//! cleanup when a media-bearing item is ultimately rejected.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Upload/delete surface for attached media
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store raw bytes, returning the public URL of the blob
    async fn upload(&self, data: &[u8], content_type: &str) -> Result<String>;

    /// Delete a previously uploaded blob by its URL
    async fn delete(&self, url: &str) -> Result<()>;
}

/// In-memory blob store for tests and ephemeral development runs
#[derive(Default)]
pub struct InMemoryBlobStore {
    urls: Mutex<HashSet<String>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a URL is currently stored
    pub async fn contains(&self, url: &str) -> bool {
        self.urls.lock().await.contains(url)
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.urls.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.urls.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, data: &[u8], content_type: &str) -> Result<String> {
        if data.is_empty() {
            return Err(Error::storage("empty blob"));
        }

        let url = format!(
            "memory://blobs/{}.{}",
            Uuid::new_v4(),
            extension_for(content_type)
        );
        self.urls.lock().await.insert(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        // Deleting an unknown URL is a no-op: cleanup is best-effort.
        self.urls.lock().await.remove(url);
        Ok(())
    }
}

/// File extension for a media content type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/mpeg" => "mpeg",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_delete() {
        let store = InMemoryBlobStore::new();

        let url = store.upload(b"bytes", "image/png").await.unwrap();
        assert!(url.ends_with(".png"));
        assert!(store.contains(&url).await);

        store.delete(&url).await.unwrap();
        assert!(!store.contains(&url).await);
    }

    #[tokio::test]
    async fn test_delete_unknown_url_is_noop() {
        let store = InMemoryBlobStore::new();
        store.delete("memory://blobs/missing.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_blob_rejected() {
        let store = InMemoryBlobStore::new();
        assert!(store.upload(b"", "image/png").await.is_err());
    }
}
