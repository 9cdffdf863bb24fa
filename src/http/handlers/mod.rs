//! HTTP API handlers organized by resource.

pub mod images;
pub mod system;
pub mod users;

// Re-export all handlers for use in routing
pub(crate) use images::{
    delete_image, edit_acl, get_content, like_image, query_images, unlike_image, upload_image,
};
pub(crate) use system::{health, metrics};
pub(crate) use users::query_users;

use crate::error::Error;
use crate::model::RecordId;

/// Parses an image id from a path segment.
pub(crate) fn image_id(raw: &str) -> Result<RecordId, Error> {
    raw.parse()
        .map_err(|_| Error::validation(format!("invalid image ID passed in: {raw}")))
}
