//! imgrepo: an image repository backend with per-image access control.
//!
//! Images carry a visibility policy (`public`, or `private` with an explicit
//! access list). Every read is filtered by a visibility predicate built from
//! the caller's identity, and every write is scoped by either the same
//! predicate (likes) or by ownership (ACL edits, deletion).
//!
//! The crate is organised bottom-up:
//!
//! - [`store`] - generic filtered document collections (memory and redb)
//! - [`blob`] - key-addressed image bytes (memory and filesystem)
//! - [`auth`] - session token verification and caller identity resolution
//! - [`access`] - visibility predicates, query compilation and mutations
//! - [`http`] - the axum surface tying it together

pub mod access;
pub mod audit;
pub mod auth;
pub mod blob;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod model;
pub mod paths;
pub mod store;

pub use error::{Error, Result};
