//! Record store with pluggable backends.
//!
//! A small document-collection abstraction: documents are JSON objects keyed
//! by a store-generated `_id`, queried with a [`Filter`] tree and mutated with
//! set-style [`Update`]s. Supports multiple backends:
//!
//! - **RedbRecordBackend**: Persistent storage with ACID guarantees (default for the server)
//! - **MemoryRecordBackend**: Fast, non-persistent storage (ideal for testing/embedding)
//!
//! Zero matched documents is always a value ([`UpdateResult`], [`DeleteResult`],
//! an empty `Vec`), never an error, so callers can tell "nothing there" apart
//! from "the store failed".
//!
//! # Example
//!
//! ```ignore
//! use imgrepo::model::{Image, fields};
//! use imgrepo::store::{Filter, FindOptions, RecordStore};
//!
//! let store = RecordStore::memory();
//! let public = Filter::eq(fields::ACCESS_LEVEL, "public");
//! let images: Vec<Image> = store.find(&public, &FindOptions::new().limit(10)).await?;
//! ```
//!
//! # Custom Backends
//!
//! Implement the `RecordBackend` trait to use custom storage:
//!
//! ```ignore
//! use imgrepo::store::{RecordBackend, RecordStore};
//!
//! struct MongoBackend { /* ... */ }
//! impl RecordBackend for MongoBackend { /* ... */ }
//!
//! let store = RecordStore::custom(MongoBackend::new());
//! ```

mod backend;
mod document;
mod filter;
mod memory;
mod redb;
mod store;
mod update;


// Re-export the public API
pub use backend::{DeleteResult, RecordBackend, UpdateResult};
pub use document::{Document, ID_FIELD, Record, decode, encode};
pub use filter::{Direction, Filter, FindOptions, Sort};
pub use memory::MemoryRecordBackend;
pub use redb::RedbRecordBackend;
pub use store::RecordStore;
pub use update::Update;
