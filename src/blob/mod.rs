//! Key-addressed blob storage for image bytes.
//!
//! Blobs are stored under the identifier of the image record that owns them.
//! The store keeps no content types and no metadata. The record
//! store is the source of truth and a blob without a record is an orphan
//! (see `imgrepo reconcile`).
//!
//! Security features:
//! - Key validation (no path separators, no traversal)
//! - Atomic writes on the filesystem backend (temp file + rename)
//!
//! # Backends
//!
//! - [`FilesystemBlobBackend`]: one file per key under a base directory
//! - [`MemoryBlobBackend`]: `DashMap`, for tests and ephemeral servers
//!
//! # Example
//!
//! ```ignore
//! use imgrepo::blob::BlobStore;
//!
//! let blobs = BlobStore::filesystem("~/.imgrepo/blobs")?;
//! blobs.put("5f1d7a...", bytes).await?;
//! ```

mod backend;
mod filesystem;
mod memory;
mod store;
mod validation;

#[cfg(test)]
mod tests;

pub use backend::BlobBackend;
pub use filesystem::FilesystemBlobBackend;
pub use memory::MemoryBlobBackend;
pub use store::BlobStore;
