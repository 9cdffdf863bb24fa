//! Path utilities for imgrepo data.
//!
//! # Base Directory
//! - [`get_imgrepo_dir`] - `~/.imgrepo/` (base directory for all imgrepo data)
//!
//! # Storage
//! - [`records_path`] - `<data_dir>/records.redb` (image and user records)
//! - [`blobs_dir`] - `<data_dir>/blobs/` (image content)
//!
//! # Configuration
//! - [`get_config_path`] - `~/.imgrepo/imgrepo.toml`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants;

// =============================================================================
// Base Directory
// =============================================================================

/// Get the imgrepo base directory.
///
/// Resolution order:
/// 1. `IMGREPO_HOME` environment variable (if set)
/// 2. `~/.imgrepo/` (default)
pub fn get_imgrepo_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(constants::HOME_ENV)
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".imgrepo"))
}

/// Expands a leading `~/` to the user's home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Record database inside a data directory: `<data_dir>/records.redb`
#[must_use]
pub fn records_path(data_dir: &Path) -> PathBuf {
    data_dir.join("records.redb")
}

/// Blob directory inside a data directory: `<data_dir>/blobs/`
#[must_use]
pub fn blobs_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("blobs")
}

// =============================================================================
// Configuration
// =============================================================================

/// Default configuration file: `~/.imgrepo/imgrepo.toml`
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_imgrepo_dir()?.join(constants::CONFIG_FILE_NAME))
}
