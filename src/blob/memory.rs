//! In-memory blob backend.
//!
//! Provides a fast, non-persistent blob store using DashMap for
//! concurrent access. Ideal for testing, development, and embedded use cases.

use super::backend::BlobBackend;
use super::validation::validate_key;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

/// In-memory blob backend using DashMap.
///
/// All data is lost when the process exits. `Bytes` values are reference
/// counted, so `get` never copies the blob.
#[derive(Clone, Default)]
pub struct MemoryBlobBackend {
    data: DashMap<String, Bytes>,
}

impl MemoryBlobBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of blobs in the store.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        validate_key(key)?;
        self.data.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        validate_key(key)?;
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.data.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.data.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}
