//! Set-style updates applied atomically to a single document.

use anyhow::{Result, bail};
use serde_json::Value;

use super::document::{Document, ID_FIELD};

/// Mutation applied to every document matched by an update filter.
///
/// Both variants treat the field as a set, so repeating an update is a no-op
/// and reports the document as unmodified.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Append each value not already present. Creates the array if missing.
    AddToSet { field: String, values: Vec<Value> },
    /// Remove every occurrence of each value.
    Pull { field: String, values: Vec<Value> },
}

impl Update {
    pub fn add_to_set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::AddToSet {
            field: field.into(),
            values: vec![value.into()],
        }
    }

    pub fn add_each_to_set<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::AddToSet {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn pull(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Pull {
            field: field.into(),
            values: vec![value.into()],
        }
    }

    pub fn pull_all<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Pull {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Field targeted by this update.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::AddToSet { field, .. } | Self::Pull { field, .. } => field,
        }
    }

    /// Applies the update in place and reports whether the document changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update targets `_id` or a field that holds a
    /// non-array value. The document is left untouched in that case.
    pub fn apply(&self, document: &mut Document) -> Result<bool> {
        let field = self.field();
        if field == ID_FIELD {
            bail!("Updates cannot modify '{ID_FIELD}'");
        }

        match self {
            Self::AddToSet { values, .. } => {
                let slot = document
                    .entry(field.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                let Value::Array(members) = slot else {
                    bail!("Field '{field}' is not an array");
                };
                let before = members.len();
                for value in values {
                    if !members.contains(value) {
                        members.push(value.clone());
                    }
                }
                Ok(members.len() != before)
            },
            Self::Pull { values, .. } => match document.get_mut(field) {
                None => Ok(false),
                Some(Value::Array(members)) => {
                    let before = members.len();
                    members.retain(|member| !values.contains(member));
                    Ok(members.len() != before)
                },
                Some(_) => bail!("Field '{field}' is not an array"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_add_to_set_is_idempotent() {
        let mut d = doc(json!({"likes": []}));
        let update = Update::add_to_set("likes", "u1");

        assert!(update.apply(&mut d).unwrap());
        assert!(!update.apply(&mut d).unwrap());
        assert_eq!(d["likes"], json!(["u1"]));
    }

    #[test]
    fn test_add_to_set_creates_missing_field() {
        let mut d = doc(json!({}));
        assert!(Update::add_each_to_set("acl", ["a", "b", "a"]).apply(&mut d).unwrap());
        assert_eq!(d["acl"], json!(["a", "b"]));
    }

    #[test]
    fn test_pull_absent_member_is_unmodified() {
        let mut d = doc(json!({"likes": ["u1"]}));
        assert!(!Update::pull("likes", "u2").apply(&mut d).unwrap());
        assert!(Update::pull("likes", "u1").apply(&mut d).unwrap());
        assert_eq!(d["likes"], json!([]));
        assert!(!Update::pull("missing", "u1").apply(&mut d).unwrap());
    }

    #[test]
    fn test_pull_all_removes_every_value() {
        let mut d = doc(json!({"acl": ["a", "b", "c"]}));
        assert!(Update::pull_all("acl", ["a", "c"]).apply(&mut d).unwrap());
        assert_eq!(d["acl"], json!(["b"]));
    }

    #[test]
    fn test_rejects_non_array_and_id() {
        let mut d = doc(json!({"_id": "x", "caption": "hi"}));
        assert!(Update::add_to_set("caption", "u1").apply(&mut d).is_err());
        assert!(Update::pull("caption", "u1").apply(&mut d).is_err());
        assert!(Update::add_to_set("_id", "y").apply(&mut d).is_err());
        assert_eq!(d["caption"], "hi");
    }
}
