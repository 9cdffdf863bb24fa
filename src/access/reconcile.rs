//! Detection of blobs left behind by partially failed deletes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::blob::BlobStore;
use crate::error::Result;
use crate::model::{IMAGES, RecordId, fields};
use crate::store::{Filter, FindOptions, Record, RecordStore};

/// Identifier-only projection of an image.
#[derive(Debug, Serialize, Deserialize)]
struct ImageKey {
    #[serde(rename = "_id")]
    id: RecordId,
}

impl Record for ImageKey {
    const COLLECTION: &'static str = IMAGES;
}

/// Returns blob keys that no image record refers to, sorted.
///
/// # Errors
///
/// Returns [`Error::Dependency`](crate::Error::Dependency) if either store
/// cannot be listed.
pub async fn find_orphaned_blobs(records: &RecordStore, blobs: &BlobStore) -> Result<Vec<String>> {
    let keys = blobs.list().await?;
    if keys.is_empty() {
        return Ok(keys);
    }

    let ids: BTreeSet<RecordId> = keys.iter().filter_map(|k| k.parse().ok()).collect();
    let known: BTreeSet<String> = if ids.is_empty() {
        BTreeSet::new()
    } else {
        let options = FindOptions::new().projection([fields::ID]);
        records
            .find::<ImageKey>(&Filter::is_in(fields::ID, &ids), &options)
            .await?
            .into_iter()
            .map(|key| key.id.to_string())
            .collect()
    };

    Ok(keys.into_iter().filter(|k| !known.contains(k)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessLevel, NewImage};
    use chrono::Utc;

    #[tokio::test]
    async fn test_finds_unreferenced_blobs() {
        let records = RecordStore::memory();
        let blobs = BlobStore::memory();

        let kept = records
            .insert(&NewImage {
                author_id: RecordId::generate(),
                access_level: AccessLevel::Public,
                access_list: BTreeSet::new(),
                likes: BTreeSet::new(),
                caption: String::new(),
                uploaded_at: Utc::now(),
            })
            .await
            .unwrap();
        let orphan = RecordId::generate().to_string();

        blobs.put(&kept.to_string(), b"a".to_vec()).await.unwrap();
        blobs.put(&orphan, b"b".to_vec()).await.unwrap();
        blobs.put("stray-file", b"c".to_vec()).await.unwrap();

        let mut expected = vec![orphan, "stray-file".to_string()];
        expected.sort();
        assert_eq!(find_orphaned_blobs(&records, &blobs).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_empty_stores() {
        let orphans = find_orphaned_blobs(&RecordStore::memory(), &BlobStore::memory())
            .await
            .unwrap();
        assert!(orphans.is_empty());
    }
}
