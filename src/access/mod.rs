//! Visibility predicates, query compilation and access-controlled mutations.
//!
//! This is the authorization core. Reads are gated by the visibility
//! predicate: an image is visible to a caller when it is public, when the
//! caller is on its access list, or when the caller wrote it. Writes are
//! gated more tightly:
//!
//! | Operation | Scope |
//! |---|---|
//! | query, fetch content | visibility |
//! | like, unlike | `_id` AND visibility |
//! | ACL edit, delete | `_id` AND `authorid = caller` |
//!
//! A scope that matches nothing yields [`Error::NotFound`](crate::Error)
//! whether the image is missing or merely hidden, so callers cannot probe for
//! the existence of private images.
//!
//! # Example
//!
//! ```ignore
//! use imgrepo::access::{ImageQueryParams, ImageReader, QueryLimits};
//!
//! let reader = ImageReader::new(records, blobs, QueryLimits::default());
//! let images = reader.query_metadata(&params, caller.as_ref()).await?;
//! ```

mod mime;
mod mutation;
mod query;
mod reader;
mod reconcile;
mod users;
mod visibility;

pub use mime::{ACCEPTED_IMAGE_TYPES, is_accepted, sniff, validate_upload};
pub use mutation::{AclEdit, AclOutcome, MutationExecutor, Upload};
pub use query::{CompiledQuery, ImageQueryParams, QueryLimits, build_image_query};
pub use reader::{ImageContent, ImageReader};
pub use reconcile::find_orphaned_blobs;
pub use users::{UserQueryParams, build_user_query};
pub use visibility::{build_visibility, ownership, visible_image};

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::RecordId;

/// Splits a comma-separated parameter, trimming entries and dropping blanks.
pub(crate) fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parses a comma-separated identifier list, collapsing duplicates.
///
/// `what` names the identifier kind in the validation message, e.g.
/// `"image"` yields `invalid image ID passed in: <entry>`.
pub(crate) fn parse_id_list(raw: &str, what: &str) -> Result<BTreeSet<RecordId>> {
    split_list(raw)
        .map(|entry| {
            entry
                .parse()
                .map_err(|_| Error::validation(format!("invalid {what} ID passed in: {entry}")))
        })
        .collect()
}

/// Parses user identifiers from a request body, collapsing duplicates.
pub(crate) fn parse_user_ids<'a, I>(raw: I) -> Result<BTreeSet<RecordId>>
where
    I: IntoIterator<Item = &'a String>,
{
    raw.into_iter()
        .map(|entry| {
            entry
                .parse()
                .map_err(|_| Error::validation(format!("invalid user id: {entry}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        let parts: Vec<&str> = split_list(" a, ,b,,").collect();
        assert_eq!(parts, vec!["a", "b"]);
        assert_eq!(split_list("").count(), 0);
    }

    #[test]
    fn test_parse_id_list_dedupes() {
        let id = RecordId::generate();
        let raw = format!("{id},{id}");
        let ids = parse_id_list(&raw, "image").unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_parse_id_list_reports_first_bad_entry() {
        let raw = format!("{},nope", RecordId::generate());
        let err = parse_id_list(&raw, "image").unwrap_err();
        assert_eq!(err.to_string(), "invalid image ID passed in: nope");
    }
}
