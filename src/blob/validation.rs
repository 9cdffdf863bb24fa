//! Key validation for the blob store.
//!
//! Keys map directly onto file names, so anything that could escape the
//! base directory or collide with temp files is rejected.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Prefix of in-flight temp files in the filesystem backend.
pub(crate) const TEMP_PREFIX: &str = ".tmp-";

/// Validates a blob key.
///
/// # Security
/// Rejects keys that:
/// - Are empty
/// - Start with `.` (hidden files, `.`/`..`, in-flight temp files)
/// - Contain anything besides ASCII letters, digits, `-`, `_` and `.`
///
/// # Examples
/// ```ignore
/// validate_key("5f1d7a0c9e2b4d3a8f6e1c0b9a8d7e6f")  // Ok
/// validate_key("../etc/passwd")                      // Error
/// validate_key("images/logo.png")                    // Error: separator
/// ```
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Blob key cannot be empty");
    }

    if key.starts_with('.') {
        bail!("Blob key cannot start with '.': {key}");
    }

    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        bail!("Blob key contains invalid character {bad:?}: {key}");
    }

    Ok(())
}

/// Returns the filesystem path for a blob given a base directory and key.
pub(crate) fn blob_path(base_dir: &Path, key: &str) -> Result<PathBuf> {
    validate_key(key)?;
    Ok(base_dir.join(key))
}
