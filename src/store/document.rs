//! Documents and the typed decode step at the store boundary.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::RecordId;

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Field holding the store-generated identifier.
pub const ID_FIELD: &str = "_id";

/// A typed record bound to a collection.
///
/// Several record types may share a collection (a full record, its insert
/// draft, and projections of it).
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the record lives in.
    const COLLECTION: &'static str;
}

/// Serializes a record into a document.
///
/// # Errors
///
/// Returns an error if the record does not serialize to a JSON object.
pub fn encode<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record).context("Failed to serialize record")? {
        Value::Object(map) => Ok(map),
        other => bail!("Record must serialize to an object, got: {other}"),
    }
}

/// Decodes a document into a typed record, validating its shape.
///
/// # Errors
///
/// Returns an error if the document does not match the record schema.
pub fn decode<T: DeserializeOwned>(document: Document) -> Result<T> {
    let id = document_id(&document).map(str::to_string);
    serde_json::from_value(Value::Object(document)).with_context(|| {
        format!(
            "Document '{}' does not match the expected schema",
            id.as_deref().unwrap_or("<no id>")
        )
    })
}

/// Returns the `_id` of a document, if it has one.
pub(crate) fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Assigns an identifier to a document about to be inserted.
///
/// A caller-provided `_id` is kept if it is a valid identifier; a missing or
/// null one is generated.
pub(crate) fn prepare_insert(mut document: Document) -> Result<(RecordId, Document)> {
    let id = match document.get(ID_FIELD) {
        None | Some(Value::Null) => RecordId::generate(),
        Some(Value::String(raw)) => raw
            .parse()
            .with_context(|| format!("Invalid _id on insert: {raw}"))?,
        Some(other) => bail!("Invalid _id on insert: {other}"),
    };
    document.insert(ID_FIELD.to_string(), Value::from(id));
    Ok((id, document))
}
