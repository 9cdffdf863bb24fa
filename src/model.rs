//! Typed records persisted in the record store.
//!
//! Field names match the stored document layout (`_id`, `authorid`,
//! `accessListIDs`, ...) so filters built in [`crate::access`] and the serde
//! representation here always agree. Use the constants in [`fields`] rather
//! than string literals when building filters.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::store::Record;

/// Collection holding image metadata.
pub const IMAGES: &str = "images";

/// Collection holding user accounts.
pub const USERS: &str = "users";

/// Stored field names.
pub mod fields {
    pub const ID: &str = "_id";
    pub const AUTHOR: &str = "authorid";
    pub const ACCESS_LEVEL: &str = "accessLevel";
    pub const ACCESS_LIST: &str = "accessListIDs";
    pub const LIKES: &str = "likes";
    pub const CAPTION: &str = "caption";
    pub const UPLOADED_AT: &str = "uploadDateTime";
    pub const NAME: &str = "name";
    pub const HANDLE: &str = "userHandle";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
}

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque record identifier, rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

/// Error returned when a string is not a record identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record id: {0}")]
pub struct InvalidRecordId(pub String);

impl RecordId {
    /// Length of the textual form.
    pub const LEN: usize = 32;

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the canonical form is accepted so string comparisons in
        // stored documents stay exact.
        let canonical = s.len() == Self::LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return Err(InvalidRecordId(s.to_string()));
        }
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|_| InvalidRecordId(s.to_string()))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::String(id.to_string())
    }
}

impl From<&RecordId> for Value {
    fn from(id: &RecordId) -> Self {
        Value::String(id.to_string())
    }
}

// =============================================================================
// Images
// =============================================================================

/// Visibility tier of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Visible to every caller, including anonymous ones.
    #[default]
    Public,
    /// Visible to the author and to users on the access list.
    Private,
}

impl AccessLevel {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown access level '{other}'")),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored image metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(rename = "authorid")]
    pub author_id: RecordId,
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
    /// Only consulted when `access_level` is not public.
    #[serde(rename = "accessListIDs", default)]
    pub access_list: BTreeSet<RecordId>,
    #[serde(default)]
    pub likes: BTreeSet<RecordId>,
    #[serde(default)]
    pub caption: String,
    #[serde(rename = "uploadDateTime", with = "chrono::serde::ts_milliseconds")]
    pub uploaded_at: DateTime<Utc>,
}

impl Record for Image {
    const COLLECTION: &'static str = IMAGES;
}

impl Image {
    /// Whether `caller` may read this image.
    ///
    /// Mirrors [`crate::access::build_visibility`] for records already in memory.
    #[must_use]
    pub fn is_visible_to(&self, caller: Option<&RecordId>) -> bool {
        match (self.access_level, caller) {
            (AccessLevel::Public, _) => true,
            (AccessLevel::Private, Some(caller)) => {
                self.author_id == *caller || self.access_list.contains(caller)
            },
            (AccessLevel::Private, None) => false,
        }
    }
}

/// Image metadata before insertion; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    #[serde(rename = "authorid")]
    pub author_id: RecordId,
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
    #[serde(rename = "accessListIDs", default)]
    pub access_list: BTreeSet<RecordId>,
    #[serde(default)]
    pub likes: BTreeSet<RecordId>,
    #[serde(default)]
    pub caption: String,
    #[serde(rename = "uploadDateTime", with = "chrono::serde::ts_milliseconds")]
    pub uploaded_at: DateTime<Utc>,
}

impl Record for NewImage {
    const COLLECTION: &'static str = IMAGES;
}

impl NewImage {
    /// Attach the identifier generated on insert.
    #[must_use]
    pub fn into_image(self, id: RecordId) -> Image {
        Image {
            id,
            author_id: self.author_id,
            access_level: self.access_level,
            access_list: self.access_list,
            likes: self.likes,
            caption: self.caption,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Image metadata returned by queries, with the author's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageView {
    #[serde(flatten)]
    pub image: Image,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<UserSummary>,
}

// =============================================================================
// Users
// =============================================================================

/// Stored user account.
///
/// Never serialized outward; responses use [`UserSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "userHandle")]
    pub handle: String,
    pub email: String,
    #[serde(rename = "password", default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl Record for User {
    const COLLECTION: &'static str = USERS;
}

/// User account before insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    #[serde(rename = "userHandle")]
    pub handle: String,
    pub email: String,
    #[serde(rename = "password", default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl Record for NewUser {
    const COLLECTION: &'static str = USERS;
}

impl NewUser {
    /// Attach the identifier generated on insert.
    #[must_use]
    pub fn into_user(self, id: RecordId) -> User {
        User {
            id,
            name: self.name,
            handle: self.handle,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "userHandle", default)]
    pub handle: String,
}

impl Record for UserSummary {
    const COLLECTION: &'static str = USERS;
}
