//! Visibility-filtered reads.

use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;
use tracing::warn;

use super::mime::sniff;
use super::query::{ImageQueryParams, QueryLimits, build_image_query};
use super::users::{UserQueryParams, build_user_query};
use super::visibility::visible_image;
use crate::blob::BlobStore;
use crate::error::{Error, Result};
use crate::model::{Image, ImageView, RecordId, UserSummary, fields};
use crate::store::{Filter, FindOptions, RecordStore};

/// Fallback content type for stored bytes no sniffer recognizes.
const OCTET_STREAM: &str = "application/octet-stream";

/// Image bytes with the content type detected from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContent {
    pub data: Bytes,
    pub content_type: &'static str,
}

/// Executes read queries on behalf of a caller.
#[derive(Clone)]
pub struct ImageReader {
    records: RecordStore,
    blobs: BlobStore,
    limits: QueryLimits,
}

impl ImageReader {
    pub fn new(records: RecordStore, blobs: BlobStore, limits: QueryLimits) -> Self {
        Self {
            records,
            blobs,
            limits,
        }
    }

    /// Runs an image metadata query and attaches each author's profile.
    ///
    /// A failed author lookup is logged and the images are returned without
    /// author details.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for malformed explicit ids
    /// - [`Error::Dependency`] if the image query fails
    pub async fn query_metadata(
        &self,
        params: &ImageQueryParams,
        caller: Option<&RecordId>,
    ) -> Result<Vec<ImageView>> {
        let query = build_image_query(params, caller, self.limits)?;
        let images: Vec<Image> = self.records.find(&query.filter, &query.options).await?;

        let authors = self.authors_of(&images).await;
        Ok(images
            .into_iter()
            .map(|image| {
                let author = authors.get(&image.author_id).cloned();
                ImageView { image, author }
            })
            .collect())
    }

    async fn authors_of(&self, images: &[Image]) -> HashMap<RecordId, UserSummary> {
        let ids: BTreeSet<RecordId> = images.iter().map(|image| image.author_id).collect();
        if ids.is_empty() {
            return HashMap::new();
        }

        let options = FindOptions::new().projection([fields::NAME, fields::HANDLE]);
        match self
            .records
            .find::<UserSummary>(&Filter::is_in(fields::ID, &ids), &options)
            .await
        {
            Ok(users) => users.into_iter().map(|user| (user.id, user)).collect(),
            Err(e) => {
                warn!(
                    error = %format!("{e:#}"),
                    "Author lookup failed; returning images without authors"
                );
                HashMap::new()
            },
        }
    }

    /// Fetches an image's bytes if the caller may see it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the image is missing, hidden, or has no content
    /// - [`Error::Dependency`] on store failure
    pub async fn fetch_content(
        &self,
        image: &RecordId,
        caller: Option<&RecordId>,
    ) -> Result<ImageContent> {
        let visible = self
            .records
            .count::<Image>(&visible_image(image, caller))
            .await?;
        if visible == 0 {
            return Err(Error::not_found("image not found"));
        }

        let data = self
            .blobs
            .get(&image.to_string())
            .await?
            .ok_or_else(|| Error::not_found("image content not found"))?;

        let content_type = sniff(&data).unwrap_or(OCTET_STREAM);
        Ok(ImageContent { data, content_type })
    }

    /// Runs a user directory query.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for malformed ids
    /// - [`Error::Dependency`] on store failure
    pub async fn query_users(&self, params: &UserQueryParams) -> Result<Vec<UserSummary>> {
        let query = build_user_query(params)?;
        Ok(self.records.find(&query.filter, &query.options).await?)
    }
}
