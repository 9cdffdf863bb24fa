//! Access-controlled mutations.
//!
//! Each mutation is a single scoped store update, so authorization and the
//! write cannot be separated by a concurrent change. Likes are scoped by
//! visibility; ACL edits and deletion by ownership.

use std::collections::BTreeSet;

use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::mime::validate_upload;
use super::visibility::{ownership, visible_image};
use super::parse_user_ids;
use crate::audit::{AuditEvent, log_audit_event};
use crate::blob::BlobStore;
use crate::error::{Error, Result};
use crate::model::{AccessLevel, Image, NewImage, RecordId, User, fields};
use crate::store::{Filter, RecordStore, Update};

const IMAGE_NOT_FOUND: &str = "image not found";

/// Body of an ACL edit: user ids to grant and to revoke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AclEdit {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Whether an ACL edit changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclOutcome {
    Updated,
    Unchanged,
}

/// An image upload as received from the client.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Content type declared by the client for the file part.
    pub content_type: Option<String>,
    pub data: Bytes,
    /// `public` or `private`. Anything else means public.
    pub access_level: Option<String>,
    /// JSON array of user ids. Unparseable JSON means an empty list.
    pub access_list: Option<String>,
    pub caption: String,
}

/// Executes writes against the record and blob stores.
#[derive(Clone)]
pub struct MutationExecutor {
    records: RecordStore,
    blobs: BlobStore,
}

impl MutationExecutor {
    pub fn new(records: RecordStore, blobs: BlobStore) -> Self {
        Self { records, blobs }
    }

    /// Adds the caller to an image's likes.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the image is missing or not visible
    /// - [`Error::Conflict`] if the caller already likes it
    /// - [`Error::Dependency`] on store failure
    pub async fn like(&self, caller: &RecordId, image: &RecordId) -> Result<()> {
        self.set_like(caller, image, Update::add_to_set(fields::LIKES, caller), "already liked image")
            .await
    }

    /// Removes the caller from an image's likes.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the image is missing or not visible
    /// - [`Error::Conflict`] if the caller does not like it
    /// - [`Error::Dependency`] on store failure
    pub async fn unlike(&self, caller: &RecordId, image: &RecordId) -> Result<()> {
        self.set_like(caller, image, Update::pull(fields::LIKES, caller), "already unliked image")
            .await
    }

    async fn set_like(
        &self,
        caller: &RecordId,
        image: &RecordId,
        update: Update,
        redundant: &str,
    ) -> Result<()> {
        let result = self
            .records
            .update_one::<Image>(&visible_image(image, Some(caller)), &update)
            .await?;

        match (result.matched, result.modified) {
            (0, _) => Err(Error::not_found(IMAGE_NOT_FOUND)),
            (_, 0) => Err(Error::conflict(redundant)),
            _ => Ok(()),
        }
    }

    /// Grants and revokes access to a private image. Owner only.
    ///
    /// Validation happens before any write: both lists empty, a malformed id,
    /// an id in both lists, or an unknown user all fail without touching the
    /// record. The add step runs before the remove step and an error in
    /// either stops the operation.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for malformed or contradictory input
    /// - [`Error::NotFound`] if a user is unknown, or the image is missing or
    ///   not owned by the caller
    /// - [`Error::Dependency`] on store failure
    pub async fn edit_acl(
        &self,
        caller: &RecordId,
        image: &RecordId,
        edit: &AclEdit,
    ) -> Result<AclOutcome> {
        if edit.add.is_empty() && edit.remove.is_empty() {
            return Err(Error::validation("no users passed to add/remove array"));
        }

        let add = parse_user_ids(&edit.add)?;
        let remove = parse_user_ids(&edit.remove)?;

        if let Some(both) = add.intersection(&remove).next() {
            return Err(Error::validation(format!(
                "user id present in both add and remove sets: {both}"
            )));
        }

        let everyone: BTreeSet<RecordId> = add.union(&remove).copied().collect();
        self.ensure_users_exist(&everyone).await?;

        let scope = ownership(image, caller);
        let mut modified = 0;

        for (ids, update) in [
            (&add, Update::add_each_to_set(fields::ACCESS_LIST, add.iter())),
            (&remove, Update::pull_all(fields::ACCESS_LIST, remove.iter())),
        ] {
            if ids.is_empty() {
                continue;
            }
            let result = self.records.update_one::<Image>(&scope, &update).await?;
            if result.matched == 0 {
                return Err(Error::not_found(IMAGE_NOT_FOUND));
            }
            modified += result.modified;
        }

        Ok(if modified == 0 {
            AclOutcome::Unchanged
        } else {
            AclOutcome::Updated
        })
    }

    /// Deletes an image and its content. Owner only.
    ///
    /// The record goes first. If the blob cannot be removed afterwards the
    /// record stays deleted, the orphan is audit-logged and the call fails.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the image is missing or not owned by the caller
    /// - [`Error::Dependency`] on store failure
    pub async fn delete(&self, caller: &RecordId, image: &RecordId) -> Result<()> {
        let result = self
            .records
            .delete_one::<Image>(&ownership(image, caller))
            .await?;
        if result.deleted == 0 {
            return Err(Error::not_found(IMAGE_NOT_FOUND));
        }

        let key = image.to_string();
        match self.blobs.delete(&key).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(image = %key, "Deleted image had no stored content");
                Ok(())
            },
            Err(e) => {
                log_audit_event(AuditEvent::OrphanedBlob {
                    key,
                    error: format!("{e:#}"),
                });
                Err(Error::Dependency(e))
            },
        }
    }

    /// Stores a new image authored by the caller and returns its id.
    ///
    /// The record is inserted first to obtain the id, then the bytes are put
    /// under it. If the put fails the record is deleted again.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for non-image content or malformed user ids
    /// - [`Error::NotFound`] if an access-list user is unknown
    /// - [`Error::Dependency`] on store failure
    pub async fn create(&self, caller: &RecordId, upload: Upload) -> Result<RecordId> {
        validate_upload(upload.content_type.as_deref(), &upload.data)?;

        let access_level = match upload.access_level.as_deref().map(str::parse::<AccessLevel>) {
            Some(Ok(level)) => level,
            Some(Err(reason)) => {
                debug!(%reason, "Defaulting upload to public");
                AccessLevel::Public
            },
            None => AccessLevel::Public,
        };

        let raw_list: Vec<String> = match upload.access_list.as_deref() {
            Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
                debug!(error = %e, "Ignoring unparseable access list");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let access_list = parse_user_ids(&raw_list)?;
        self.ensure_users_exist(&access_list).await?;

        let draft = NewImage {
            author_id: *caller,
            access_level,
            access_list,
            likes: BTreeSet::new(),
            caption: upload.caption,
            uploaded_at: Utc::now(),
        };
        let id = self.records.insert(&draft).await?;

        if let Err(e) = self.blobs.put(&id.to_string(), upload.data).await {
            self.compensate(&id).await;
            return Err(Error::Dependency(e.context("Failed to store image content")));
        }

        info!(image = %id, author = %caller, "Image uploaded");
        Ok(id)
    }

    /// Best-effort removal of a record whose content never made it.
    async fn compensate(&self, id: &RecordId) {
        let outcome = self
            .records
            .delete_one::<Image>(&Filter::eq(fields::ID, id))
            .await;
        if let Err(e) = outcome {
            log_audit_event(AuditEvent::CompensationFailed {
                image: id.to_string(),
                error: format!("{e:#}"),
            });
        }
    }

    /// One batched lookup for a whole set of user ids.
    async fn ensure_users_exist(&self, ids: &BTreeSet<RecordId>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self
            .records
            .count::<User>(&Filter::is_in(fields::ID, ids))
            .await?;
        if found != ids.len() as u64 {
            return Err(Error::not_found("not all users in add/remove list found"));
        }
        Ok(())
    }
}
