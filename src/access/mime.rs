//! Accepted image types and upload content validation.

use image::ImageFormat;

use crate::error::{Error, Result};

/// MIME types accepted for upload.
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/bmp",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/webp",
];

const NON_IMAGE: &str = "uploaded non-image file type";

/// Whether a declared content type is accepted. Parameters such as
/// `; charset=...` are ignored and comparison is case-insensitive.
#[must_use]
pub fn is_accepted(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_IMAGE_TYPES.contains(&essence.as_str())
}

/// Detects an image type from magic bytes.
///
/// Returns `None` for unknown content or formats outside
/// [`ACCEPTED_IMAGE_TYPES`].
#[must_use]
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    match image::guess_format(data).ok()? {
        format @ (ImageFormat::Bmp
        | ImageFormat::Gif
        | ImageFormat::Jpeg
        | ImageFormat::Png
        | ImageFormat::WebP) => Some(format.to_mime_type()),
        _ => None,
    }
}

/// Checks both the declared type and the sniffed bytes of an upload.
///
/// They need not agree with each other, but both must be accepted image
/// types. Returns the sniffed type.
///
/// # Errors
///
/// Returns [`Error::Validation`] if either check fails.
pub fn validate_upload(declared: Option<&str>, data: &[u8]) -> Result<&'static str> {
    if !declared.is_some_and(is_accepted) {
        return Err(Error::validation(NON_IMAGE));
    }
    sniff(data).ok_or_else(|| Error::validation(NON_IMAGE))
}
