//! High-level `BlobStore` wrapper over backend implementations.

use super::backend::BlobBackend;
use super::filesystem::FilesystemBlobBackend;
use super::memory::MemoryBlobBackend;
use anyhow::Result;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;

/// High-level blob store interface.
///
/// Wraps a `BlobBackend` implementation and provides a consistent API
/// regardless of the underlying storage mechanism.
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn BlobBackend>,
}

impl BlobStore {
    /// Creates a new `BlobStore` backed by files under `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn filesystem<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let backend = FilesystemBlobBackend::open(base_dir)?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Creates a new `BlobStore` backed by memory.
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(MemoryBlobBackend::new()),
        }
    }

    /// Creates a new `BlobStore` with a custom backend.
    pub fn custom<B: BlobBackend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Stores a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    pub async fn put(&self, key: &str, data: impl Into<Bytes>) -> Result<()> {
        self.backend.put(key, data.into()).await
    }

    /// Retrieves a blob. `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the read fails.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.backend.get(key).await
    }

    /// Deletes a blob. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or deletion fails.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.backend.delete(key).await
    }

    /// Lists every stored key.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.backend.list().await
    }
}
