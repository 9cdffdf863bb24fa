//! In-memory record backend.
//!
//! Provides a fast, non-persistent document store using DashMap for
//! concurrent access. Ideal for testing, development, and embedded use cases.

use super::backend::{DeleteResult, RecordBackend, UpdateResult};
use super::document::{Document, document_id, prepare_insert};
use super::filter::{Filter, FindOptions, select};
use super::update::Update;
use crate::model::RecordId;
use anyhow::{Result, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Documents of one collection keyed by `_id`.
type Collection = BTreeMap<String, Document>;

/// In-memory record backend using DashMap.
///
/// Each collection sits behind its own shard lock, so an update holds the
/// collection exclusively for its read-modify-write and concurrent updates
/// never lose each other's changes. All data is lost when the process exits.
///
/// # Example
///
/// ```ignore
/// use imgrepo::store::MemoryRecordBackend;
///
/// let backend = MemoryRecordBackend::new();
/// let id = backend.insert_one("images", document).await?;
/// ```
#[derive(Default)]
pub struct MemoryRecordBackend {
    collections: DashMap<String, Collection>,
}

impl MemoryRecordBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents across all collections.
    pub fn len(&self) -> usize {
        self.collections.iter().map(|c| c.value().len()).sum()
    }

    /// Returns true if no collection holds a document.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        many: bool,
    ) -> Result<UpdateResult> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };

        // Stage every change first so a failure leaves the collection intact.
        let mut staged = Vec::new();
        let mut result = UpdateResult::default();
        for (key, doc) in docs.iter().filter(|(_, doc)| filter.matches(doc)) {
            let mut next = doc.clone();
            result.matched += 1;
            if update.apply(&mut next)? {
                result.modified += 1;
                staged.push((key.clone(), next));
            }
            if !many {
                break;
            }
        }

        for (key, doc) in staged {
            docs.insert(key, doc);
        }
        Ok(result)
    }

    fn delete(&self, collection: &str, filter: &Filter, many: bool) -> DeleteResult {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return DeleteResult::default();
        };

        let mut doomed: Vec<String> = docs
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(key, _)| key.clone())
            .collect();
        if !many {
            doomed.truncate(1);
        }

        for key in &doomed {
            docs.remove(key);
        }
        DeleteResult {
            deleted: doomed.len() as u64,
        }
    }
}

#[async_trait]
impl RecordBackend for MemoryRecordBackend {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| select(docs.values(), filter, options))
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<RecordId> {
        let (id, document) = prepare_insert(document)?;
        let key = document_id(&document)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&key) {
            bail!("Duplicate _id '{key}' in collection '{collection}'");
        }
        docs.insert(key, document);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult> {
        self.update(collection, filter, update, false)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult> {
        self.update(collection, filter, update, true)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult> {
        Ok(self.delete(collection, filter, false))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<DeleteResult> {
        Ok(self.delete(collection, filter, true))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.values().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }
}
