//! High-level `RecordStore` wrapper over backend implementations.
//!
//! Provides a typed API that wraps any `RecordBackend` implementation.

use super::backend::{DeleteResult, RecordBackend, UpdateResult};
use super::document::{Record, decode, document_id, encode};
use super::filter::{Filter, FindOptions};
use super::memory::MemoryRecordBackend;
use super::redb::RedbRecordBackend;
use super::update::Update;
use crate::model::RecordId;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Typed document store.
///
/// Wraps a `RecordBackend` implementation. Documents are decoded into
/// [`Record`] types at this boundary; a stored document that no longer
/// matches its schema is skipped by `find` with a warning rather than
/// failing the whole query.
///
/// # Example
///
/// ```ignore
/// use imgrepo::model::Image;
/// use imgrepo::store::{Filter, FindOptions, RecordStore};
///
/// let store = RecordStore::memory();
/// let images: Vec<Image> = store.find(&Filter::All, &FindOptions::new()).await?;
/// ```
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn RecordBackend>,
}

impl RecordStore {
    /// Creates a new `RecordStore` backed by a file-based redb database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let backend = RedbRecordBackend::open(path)?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Creates a new `RecordStore` backed by an in-memory store.
    ///
    /// All data is lost when the process exits.
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(MemoryRecordBackend::new()),
        }
    }

    /// Creates a new `RecordStore` with a custom backend.
    pub fn custom<B: RecordBackend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Finds records of type `T` in its collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn find<T: Record>(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<T>> {
        let docs = self.backend.find(T::COLLECTION, filter, options).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = document_id(&doc).unwrap_or("<no id>").to_string();
            match decode(doc) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        collection = T::COLLECTION,
                        id = %id,
                        error = %e,
                        "Skipping document that does not match its schema"
                    );
                },
            }
        }
        Ok(records)
    }

    /// Finds the first record of type `T` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails or the document does
    /// not match the schema of `T`.
    pub async fn find_one<T: Record>(&self, filter: &Filter) -> Result<Option<T>> {
        match self.backend.find_one(T::COLLECTION, filter).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Inserts a record and returns its generated identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage operation fails.
    pub async fn insert<T: Record>(&self, record: &T) -> Result<RecordId> {
        let doc = encode(record)?;
        self.backend.insert_one(T::COLLECTION, doc).await
    }

    /// Applies `update` to the first record of type `T` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be applied or storage fails.
    pub async fn update_one<T: Record>(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult> {
        self.backend.update_one(T::COLLECTION, filter, update).await
    }

    /// Applies `update` to every record of type `T` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update cannot be applied or storage fails.
    pub async fn update_many<T: Record>(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult> {
        self.backend.update_many(T::COLLECTION, filter, update).await
    }

    /// Deletes the first record of type `T` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn delete_one<T: Record>(&self, filter: &Filter) -> Result<DeleteResult> {
        self.backend.delete_one(T::COLLECTION, filter).await
    }

    /// Deletes every record of type `T` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn delete_many<T: Record>(&self, filter: &Filter) -> Result<DeleteResult> {
        self.backend.delete_many(T::COLLECTION, filter).await
    }

    /// Counts records of type `T` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn count<T: Record>(&self, filter: &Filter) -> Result<u64> {
        self.backend.count(T::COLLECTION, filter).await
    }
}
