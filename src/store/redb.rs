//! Redb-backed record backend.
//!
//! Provides persistent document storage using redb with ACID guarantees.
//! Each collection maps to one table keyed by `_id` with JSON values.

use super::backend::{DeleteResult, RecordBackend, UpdateResult};
use super::document::{Document, prepare_insert};
use super::filter::{Filter, FindOptions, select};
use super::update::Update;
use crate::model::RecordId;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition, TableError};
use std::path::Path;
use std::sync::Arc;

type CollectionTable<'a> = TableDefinition<'a, &'static str, &'static [u8]>;

fn table(collection: &str) -> CollectionTable<'_> {
    TableDefinition::new(collection)
}

/// Redb-backed record backend.
///
/// Every mutation runs its read-modify-write inside one write transaction.
/// redb serializes write transactions, so concurrent updates to the same
/// document never lose each other's changes.
///
/// # Thread Safety
///
/// `RedbRecordBackend` is `Clone` and can be shared across threads. The
/// underlying database handles concurrent access safely.
#[derive(Clone)]
pub struct RedbRecordBackend {
    db: Arc<Database>,
}

impl RedbRecordBackend {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create record directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open record database: {}", path.display()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Reads every document of a collection. Missing tables read as empty.
    fn load_sync(&self, collection: &str) -> Result<Vec<Document>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let docs = match read_txn.open_table(table(collection)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to open collection '{collection}'"));
            },
        };

        let mut out = Vec::new();
        for item in docs.iter().context("Failed to iterate collection")? {
            let (_, value) = item.context("Failed to read document")?;
            out.push(parse(value.value())?);
        }
        Ok(out)
    }

    fn find_sync(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        let docs = self.load_sync(collection)?;
        Ok(select(docs.iter(), filter, options))
    }

    fn insert_sync(&self, collection: &str, document: Document) -> Result<RecordId> {
        let (id, document) = prepare_insert(document)?;
        let key = id.to_string();
        let json = serde_json::to_vec(&document).context("Failed to serialize document")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut docs = write_txn
                .open_table(table(collection))
                .with_context(|| format!("Failed to open collection '{collection}'"))?;

            if docs
                .get(key.as_str())
                .with_context(|| format!("Failed to read document '{key}'"))?
                .is_some()
            {
                bail!("Duplicate _id '{key}' in collection '{collection}'");
            }

            docs.insert(key.as_str(), json.as_slice())
                .with_context(|| format!("Failed to insert document '{key}'"))?;
        }
        write_txn
            .commit()
            .context("Failed to commit insert transaction")?;

        Ok(id)
    }

    fn update_sync(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        many: bool,
    ) -> Result<UpdateResult> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let result = {
            let mut docs = write_txn
                .open_table(table(collection))
                .with_context(|| format!("Failed to open collection '{collection}'"))?;

            let mut result = UpdateResult::default();
            let mut staged = Vec::new();
            for (key, mut doc) in matching(&docs, filter, many)? {
                result.matched += 1;
                // An error here aborts the transaction, so nothing is written.
                if update.apply(&mut doc)? {
                    result.modified += 1;
                    staged.push((key, doc));
                }
            }

            for (key, doc) in staged {
                let json = serde_json::to_vec(&doc).context("Failed to serialize document")?;
                docs.insert(key.as_str(), json.as_slice())
                    .with_context(|| format!("Failed to write document '{key}'"))?;
            }
            result
        };

        write_txn
            .commit()
            .context("Failed to commit update transaction")?;
        Ok(result)
    }

    fn delete_sync(&self, collection: &str, filter: &Filter, many: bool) -> Result<DeleteResult> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let deleted = {
            let mut docs = write_txn
                .open_table(table(collection))
                .with_context(|| format!("Failed to open collection '{collection}'"))?;

            let doomed = matching(&docs, filter, many)?;
            for (key, _) in &doomed {
                docs.remove(key.as_str())
                    .with_context(|| format!("Failed to remove document '{key}'"))?;
            }
            doomed.len() as u64
        };

        write_txn
            .commit()
            .context("Failed to commit delete transaction")?;
        Ok(DeleteResult { deleted })
    }
}

fn parse(bytes: &[u8]) -> Result<Document> {
    serde_json::from_slice(bytes).context("Failed to deserialize document")
}

/// Collects matching documents with their keys, in `_id` order.
fn matching(
    docs: &Table<'_, &'static str, &'static [u8]>,
    filter: &Filter,
    many: bool,
) -> Result<Vec<(String, Document)>> {
    let mut out = Vec::new();
    for item in docs.iter().context("Failed to iterate collection")? {
        let (key, value) = item.context("Failed to read document")?;
        let doc = parse(value.value())?;
        if filter.matches(&doc) {
            out.push((key.value().to_string(), doc));
            if !many {
                break;
            }
        }
    }
    Ok(out)
}

#[async_trait]
impl RecordBackend for RedbRecordBackend {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        let backend = self.clone();
        let collection = collection.to_string();
        let filter = filter.clone();
        let options = options.clone();
        tokio::task::spawn_blocking(move || backend.find_sync(&collection, &filter, &options))
            .await
            .context("Task join error")?
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<RecordId> {
        let backend = self.clone();
        let collection = collection.to_string();
        tokio::task::spawn_blocking(move || backend.insert_sync(&collection, document))
            .await
            .context("Task join error")?
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult> {
        let backend = self.clone();
        let collection = collection.to_string();
        let filter = filter.clone();
        let update = update.clone();
        tokio::task::spawn_blocking(move || {
            backend.update_sync(&collection, &filter, &update, false)
        })
        .await
        .context("Task join error")?
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult> {
        let backend = self.clone();
        let collection = collection.to_string();
        let filter = filter.clone();
        let update = update.clone();
        tokio::task::spawn_blocking(move || {
            backend.update_sync(&collection, &filter, &update, true)
        })
        .await
        .context("Task join error")?
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult> {
        let backend = self.clone();
        let collection = collection.to_string();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || backend.delete_sync(&collection, &filter, false))
            .await
            .context("Task join error")?
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<DeleteResult> {
        let backend = self.clone();
        let collection = collection.to_string();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || backend.delete_sync(&collection, &filter, true))
            .await
            .context("Task join error")?
    }
}
