//! Tests for the blob store module.

use super::*;
use bytes::Bytes;
use std::fs;
use tempfile::TempDir;

fn create_fs_store() -> (BlobStore, TempDir) {
    let tmp = TempDir::new().unwrap();
    let store = BlobStore::filesystem(tmp.path().join("blobs")).unwrap();
    (store, tmp)
}

async fn exercise(store: BlobStore) {
    store.put("abc", Bytes::from_static(b"hello")).await.unwrap();
    assert_eq!(store.get("abc").await.unwrap().unwrap(), "hello");

    // Replacing keeps a single key
    store.put("abc", b"world".to_vec()).await.unwrap();
    assert_eq!(store.get("abc").await.unwrap().unwrap(), "world");

    store.put("def", Bytes::new()).await.unwrap();
    assert_eq!(store.list().await.unwrap(), vec!["abc", "def"]);

    assert!(store.delete("abc").await.unwrap());
    assert!(!store.delete("abc").await.unwrap());
    assert!(store.get("abc").await.unwrap().is_none());
    assert_eq!(store.list().await.unwrap(), vec!["def"]);
}

#[tokio::test]
async fn test_memory_backend_lifecycle() {
    exercise(BlobStore::memory()).await;
}

#[tokio::test]
async fn test_filesystem_backend_lifecycle() {
    let (store, _tmp) = create_fs_store();
    exercise(store).await;
}

#[tokio::test]
async fn test_memory_backend_counts_blobs() {
    let backend = MemoryBlobBackend::new();
    assert!(backend.is_empty());

    backend.put("abc", Bytes::from_static(b"a")).await.unwrap();
    backend.put("def", Bytes::from_static(b"d")).await.unwrap();
    backend.put("abc", Bytes::from_static(b"b")).await.unwrap();
    assert_eq!(backend.len(), 2);

    backend.delete("abc").await.unwrap();
    backend.delete("def").await.unwrap();
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_invalid_keys_rejected() {
    let (fs_store, _tmp) = create_fs_store();
    for store in [BlobStore::memory(), fs_store] {
        assert!(store.put("../escape", b"x".to_vec()).await.is_err());
        assert!(store.get("a/b").await.is_err());
        assert!(store.delete("").await.is_err());
    }
}

#[tokio::test]
async fn test_filesystem_list_skips_hidden_and_directories() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("blobs");
    let store = BlobStore::filesystem(&base).unwrap();

    store.put("visible", b"1".to_vec()).await.unwrap();
    fs::write(base.join(".tmp-leftover"), b"partial").unwrap();
    fs::create_dir(base.join("nested")).unwrap();

    assert_eq!(store.list().await.unwrap(), vec!["visible"]);
}

#[tokio::test]
async fn test_filesystem_persists_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("blobs");

    BlobStore::filesystem(&base)
        .unwrap()
        .put("keep", b"bytes".to_vec())
        .await
        .unwrap();

    let reopened = BlobStore::filesystem(&base).unwrap();
    assert_eq!(reopened.get("keep").await.unwrap().unwrap(), "bytes");
}

#[tokio::test]
async fn test_custom_backend() {
    let store = BlobStore::custom(MemoryBlobBackend::new());
    store.put("k", b"v".to_vec()).await.unwrap();
    assert!(store.get("k").await.unwrap().is_some());
}
