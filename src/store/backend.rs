//! Backend trait for the record store.
//!
//! Defines the interface that all record storage backends must implement,
//! enabling pluggable storage (redb, memory, MongoDB, etc.).

use super::document::Document;
use super::filter::{Filter, FindOptions};
use super::update::Update;
use crate::model::RecordId;
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents matched by the filter.
    pub matched: u64,
    /// Matched documents whose content actually changed.
    pub modified: u64,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted: u64,
}

/// Backend trait for document collections.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// A single-document update must be atomic: concurrent updates to the same
/// document observe each other's effects, never a lost write.
///
/// # Example
///
/// ```ignore
/// use imgrepo::store::{Filter, FindOptions, MemoryRecordBackend, RecordBackend};
///
/// let backend = MemoryRecordBackend::new();
/// let id = backend.insert_one("images", document).await?;
/// let docs = backend.find("images", &Filter::All, &FindOptions::new()).await?;
/// ```
#[async_trait]
pub trait RecordBackend: Send + Sync + 'static {
    /// Returns matching documents after sort, limit and projection.
    ///
    /// A collection that was never written to behaves as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>>;

    /// Returns the first matching document, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let options = FindOptions::new().limit(1);
        Ok(self
            .find(collection, filter, &options)
            .await?
            .into_iter()
            .next())
    }

    /// Inserts a document and returns its identifier.
    ///
    /// Generates `_id` when the document has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the `_id` is invalid or already taken, or if the
    /// underlying storage operation fails.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<RecordId>;

    /// Applies `update` to the first matching document.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be applied or the underlying
    /// storage operation fails. No document is changed on error.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult>;

    /// Applies `update` to every matching document, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be applied to some document or
    /// the underlying storage operation fails. No document is changed on error.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult>;

    /// Deletes the first matching document.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult>;

    /// Deletes every matching document.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<DeleteResult>;

    /// Counts matching documents.
    ///
    /// Default implementation uses `find()`, but backends may override
    /// for efficiency.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let docs = self.find(collection, filter, &FindOptions::new()).await?;
        Ok(docs.len() as u64)
    }
}
