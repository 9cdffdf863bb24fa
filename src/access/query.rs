//! Image query compilation.
//!
//! Turns raw query-string parameters into a single store filter plus find
//! options. Input is treated leniently (malformed bounds and limits fall
//! back to defaults) except for explicit identifiers, which must all parse.

use serde::Deserialize;

use super::{parse_id_list, split_list, visibility::build_visibility};
use crate::constants::{DEFAULT_IMAGE_LIMIT, MAX_IMAGE_LIMIT};
use crate::error::Result;
use crate::model::{RecordId, fields};
use crate::store::{Direction, Filter, FindOptions, Sort};

/// Raw parameters of `GET /images`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQueryParams {
    /// Exclusive upper bound on upload time, Unix seconds.
    pub before: Option<String>,
    /// Exclusive lower bound on upload time, Unix seconds.
    pub after: Option<String>,
    pub limit: Option<String>,
    /// Comma-separated author ids.
    pub user: Option<String>,
    /// Comma-separated image ids. Overrides every other parameter.
    pub id: Option<String>,
}

/// Result-size policy for image queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_IMAGE_LIMIT,
            max_limit: MAX_IMAGE_LIMIT,
        }
    }
}

impl QueryLimits {
    /// Resolves a raw `limit` parameter.
    ///
    /// Absent, malformed or non-positive values give the default; the
    /// result never exceeds `max_limit`.
    #[must_use]
    pub fn resolve(&self, raw: Option<&str>) -> usize {
        let requested = raw
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|&n| n >= 1)
            .map_or(self.default_limit, |n| {
                usize::try_from(n).unwrap_or(usize::MAX)
            });
        requested.min(self.max_limit)
    }
}

/// A compiled query: what to match and how to return it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub filter: Filter,
    pub options: FindOptions,
}

/// Compiles `GET /images` parameters for a caller.
///
/// With a non-empty `id` list the filter is `_id ∈ ids AND visibility` and
/// the limit is the number of distinct ids. Otherwise the filter is the AND
/// of the optional time bounds and the visibility predicate (narrowed to
/// the `user` authors when given). Results are always newest first.
///
/// # Errors
///
/// Returns [`Error::Validation`](crate::Error::Validation) if any `id` entry
/// is not a record identifier.
pub fn build_image_query(
    params: &ImageQueryParams,
    caller: Option<&RecordId>,
    limits: QueryLimits,
) -> Result<CompiledQuery> {
    let newest_first = Sort::by(fields::UPLOADED_AT, Direction::Descending);

    if let Some(raw) = params.id.as_deref() {
        let ids = parse_id_list(raw, "image")?;
        if !ids.is_empty() {
            let limit = ids.len();
            let filter = Filter::And(vec![
                Filter::is_in(fields::ID, ids),
                build_visibility(caller),
            ]);
            return Ok(CompiledQuery {
                filter,
                options: FindOptions::new().sort(newest_first).limit(limit),
            });
        }
    }

    let mut clauses = Vec::new();

    if let Some(before) = parse_seconds(params.before.as_deref()).and_then(|s| s.checked_mul(1000))
    {
        clauses.push(Filter::lt(fields::UPLOADED_AT, before));
    }

    if let Some(after) = parse_seconds(params.after.as_deref()).and_then(|s| s.checked_mul(1000))
    {
        clauses.push(Filter::gt(fields::UPLOADED_AT, after));
    }

    let authors: Vec<&str> = params
        .user
        .as_deref()
        .map(|raw| split_list(raw).collect())
        .unwrap_or_default();
    if authors.is_empty() {
        clauses.push(build_visibility(caller));
    } else {
        clauses.push(Filter::And(vec![
            build_visibility(caller),
            Filter::is_in(fields::AUTHOR, authors),
        ]));
    }

    Ok(CompiledQuery {
        filter: Filter::And(clauses),
        options: FindOptions::new()
            .sort(newest_first)
            .limit(limits.resolve(params.limit.as_deref())),
    })
}

/// Parses Unix seconds; anything else is dropped.
fn parse_seconds(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse().ok()
}
