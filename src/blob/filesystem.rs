//! Filesystem-backed blob backend.
//!
//! Provides persistent blob storage with one file per key under a base
//! directory.

use super::backend::BlobBackend;
use super::validation::{TEMP_PREFIX, blob_path};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem-backed blob backend.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so a crash mid-upload never leaves a truncated blob under a valid
/// key.
///
/// # Thread Safety
///
/// `FilesystemBlobBackend` is `Clone` and can be shared across threads.
#[derive(Clone)]
pub struct FilesystemBlobBackend {
    base_dir: Arc<PathBuf>,
}

impl FilesystemBlobBackend {
    /// Creates or opens the blob backend at the given base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create blob directory: {}", base_dir.display()))?;

        Ok(Self {
            base_dir: Arc::new(base_dir),
        })
    }

    /// Base directory holding the blobs.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn put_sync(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = blob_path(&self.base_dir, key)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(self.base_dir.as_path())
            .context("Failed to create temp file for blob")?;
        tmp.write_all(data)
            .with_context(|| format!("Failed to write blob: {key}"))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync blob: {key}"))?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to move blob into place: {key}"))?;

        Ok(())
    }

    fn get_sync(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = blob_path(&self.base_dir, key)?;

        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read blob: {key}")),
        }
    }

    fn delete_sync(&self, key: &str) -> Result<bool> {
        let path = blob_path(&self.base_dir, key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete blob: {key}")),
        }
    }

    fn list_sync(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(self.base_dir.as_path()).with_context(|| {
            format!("Failed to list blob directory: {}", self.base_dir.display())
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read blob directory entry")?;
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            // Skip in-flight temp files and anything not created by put()
            if let Some(name) = entry.file_name().to_str()
                && !name.starts_with('.')
            {
                keys.push(name.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl BlobBackend for FilesystemBlobBackend {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let backend = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || backend.put_sync(&key, &data))
            .await
            .context("Task join error")?
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let backend = self.clone();
        let key = key.to_string();
        let data = tokio::task::spawn_blocking(move || backend.get_sync(&key))
            .await
            .context("Task join error")??;
        Ok(data.map(Bytes::from))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let backend = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || backend.delete_sync(&key))
            .await
            .context("Task join error")?
    }

    async fn list(&self) -> Result<Vec<String>> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.list_sync())
            .await
            .context("Task join error")?
    }
}
