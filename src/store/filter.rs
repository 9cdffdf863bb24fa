//! Filter predicates, sort orders and find options.

use std::cmp::Ordering;

use serde_json::Value;

use super::document::{Document, ID_FIELD};

/// Predicate evaluated against a stored document.
///
/// `And(vec![])` matches everything and `Or(vec![])` matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals the value.
    Eq { field: String, value: Value },
    /// Field equals one of the values.
    In { field: String, values: Vec<Value> },
    /// Array field has the value as a member.
    Contains { field: String, value: Value },
    /// Field is strictly less than the value (numbers or strings).
    Lt { field: String, value: Value },
    /// Field is strictly greater than the value (numbers or strings).
    Gt { field: String, value: Value },
    /// String field contains the pattern, ignoring case.
    Like { field: String, pattern: String },
    /// Every sub-filter matches.
    And(Vec<Filter>),
    /// At least one sub-filter matches.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Evaluates the filter against a document.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => document.get(field) == Some(value),
            Self::In { field, values } => document
                .get(field)
                .is_some_and(|actual| values.contains(actual)),
            Self::Contains { field, value } => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|members| members.contains(value)),
            Self::Lt { field, value } => document
                .get(field)
                .and_then(|actual| compare(actual, value))
                .is_some_and(Ordering::is_lt),
            Self::Gt { field, value } => document
                .get(field)
                .and_then(|actual| compare(actual, value))
                .is_some_and(Ordering::is_gt),
            Self::Like { field, pattern } => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|actual| actual.to_lowercase().contains(&pattern.to_lowercase())),
            Self::And(filters) => filters.iter().all(|f| f.matches(document)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(document)),
        }
    }
}

/// Compares two scalars of the same kind. Mixed kinds are incomparable.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: missing < null < bool < number < string.
fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Object(_)) => 6,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) => compare(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Multi-key sort order. Ties fall through to the next key, then to `_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort(Vec<(String, Direction)>);

impl Sort {
    /// Sort by a single field.
    pub fn by(field: impl Into<String>, direction: Direction) -> Self {
        Self(vec![(field.into(), direction)])
    }

    /// Add a tie-breaking key.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.0.push((field.into(), direction));
        self
    }

    /// Sort keys in priority order.
    #[must_use]
    pub fn keys(&self) -> &[(String, Direction)] {
        &self.0
    }

    /// Compares two documents under this order.
    #[must_use]
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, direction) in &self.0 {
            let ordering = sort_order(a.get(field), b.get(field));
            let ordering = match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        sort_order(a.get(ID_FIELD), b.get(ID_FIELD))
    }
}

/// Options for `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Maximum number of documents returned. `None` means unbounded.
    pub limit: Option<usize>,
    pub sort: Sort,
    /// Fields to keep besides `_id`. `None` keeps the whole document.
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Runs filter, sort, limit and projection over a collection snapshot.
///
/// Shared by every backend so query semantics cannot drift between them.
pub(crate) fn select<'a, I>(documents: I, filter: &Filter, options: &FindOptions) -> Vec<Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut matched: Vec<&Document> = documents
        .into_iter()
        .filter(|doc| filter.matches(doc))
        .collect();

    matched.sort_by(|a, b| options.sort.compare(a, b));

    if let Some(limit) = options.limit {
        matched.truncate(limit);
    }

    matched
        .into_iter()
        .map(|doc| match &options.projection {
            Some(fields) => project(doc, fields),
            None => doc.clone(),
        })
        .collect()
}

fn project(document: &Document, fields: &[String]) -> Document {
    document
        .iter()
        .filter(|(key, _)| key.as_str() == ID_FIELD || fields.iter().any(|f| f == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
