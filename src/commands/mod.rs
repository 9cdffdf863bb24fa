//! CLI command implementations for imgrepo.
//!
//! - [`serve`] - Run the HTTP server
//! - [`token`] - Mint a session token for an existing user
//! - [`user`] - Seed user records
//! - [`reconcile`] - Find and remove blobs with no image record

pub mod reconcile;
pub mod serve;
pub mod token;
pub mod user;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::blob::BlobStore;
use crate::config::{Config, LogFormat, StorageBackend, ValidationResult};
use crate::paths;
use crate::store::RecordStore;

/// Load configuration, set up logging in its format, then log any
/// validation warnings.
///
/// Every command starts here so nothing is logged before a subscriber exists.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (config, validation) = read_config(path)?;
    init_logging(config.server.log_format);
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    Ok(config)
}

/// Load and validate configuration without logging.
pub fn read_config(path: Option<&Path>) -> Result<(Config, ValidationResult)> {
    let config = Config::load_or_default(path)?;
    let validation = config.validate()?;
    Ok((config, validation))
}

/// Open the record and blob stores described by the configuration.
pub fn open_stores(config: &Config) -> Result<(RecordStore, BlobStore)> {
    match config.storage.backend {
        StorageBackend::Memory => Ok((RecordStore::memory(), BlobStore::memory())),
        StorageBackend::File => {
            let data_dir = config.storage.data_dir()?;
            std::fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory: {}", data_dir.display())
            })?;

            let records = RecordStore::file(paths::records_path(&data_dir))?;
            let blobs = BlobStore::filesystem(paths::blobs_dir(&data_dir))?;
            info!(data_dir = %data_dir.display(), "Opened file storage");
            Ok((records, blobs))
        },
    }
}

/// Initialize logging on stderr, keeping stdout for command output.
///
/// `RUST_LOG` overrides the default `info` filter. A second call is a no-op.
pub fn init_logging(format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // A subscriber installed earlier in the process wins.
    let _ = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
}
