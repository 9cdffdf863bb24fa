//! Backend trait for the blob store.
//!
//! Defines the interface that all blob backends must implement,
//! enabling pluggable storage (filesystem, memory, S3, etc.).

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Backend trait for blob storage.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// A `put` either stores the whole blob or nothing: readers never observe a
/// partially written blob.
#[async_trait]
pub trait BlobBackend: Send + Sync + 'static {
    /// Stores a blob, replacing any previous content under the key.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Key is invalid (empty, or contains separators or `..`)
    /// - Storage operation fails
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Retrieves a blob.
    ///
    /// # Returns
    /// * `Ok(Some(data))` - Blob found
    /// * `Ok(None)` - Blob not found
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the read operation fails.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Deletes a blob.
    ///
    /// # Returns
    /// * `Ok(true)` - Blob existed and was deleted
    /// * `Ok(false)` - Blob did not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or deletion fails.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Lists every stored key, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    async fn list(&self) -> Result<Vec<String>>;
}
