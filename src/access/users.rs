//! User query compilation for `GET /users`.

use serde::Deserialize;

use super::query::CompiledQuery;
use super::{parse_id_list, split_list};
use crate::constants::USER_QUERY_LIMIT;
use crate::error::Result;
use crate::model::fields;
use crate::store::{Direction, Filter, FindOptions, Sort};

/// Raw parameters of `GET /users`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQueryParams {
    /// Comma-separated user ids. Overrides the match filters.
    pub id: Option<String>,
    /// Comma-separated names, substring-matched unless `name_exact`.
    pub name: Option<String>,
    pub name_exact: Option<String>,
    /// Comma-separated handles, substring-matched unless `user_handle_exact`.
    pub user_handle: Option<String>,
    pub user_handle_exact: Option<String>,
    /// `name` orders by (name, handle); anything else by (handle, name).
    pub order_by: Option<String>,
    /// `y` for ascending. Descending otherwise.
    pub ascending: Option<String>,
    /// Exclusive upper bound on the primary ordering key.
    pub lt: Option<String>,
    /// Exclusive lower bound on the primary ordering key.
    pub gt: Option<String>,
    pub limit: Option<String>,
}

fn flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("y" | "Y"))
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

/// Matches any of the comma-separated values, exactly or as a
/// case-insensitive substring.
fn match_any(field: &str, raw: &str, exact: bool) -> Option<Filter> {
    let values: Vec<&str> = split_list(raw).collect();
    if values.is_empty() {
        return None;
    }
    Some(if exact {
        Filter::is_in(field, values)
    } else {
        Filter::Or(values.into_iter().map(|v| Filter::like(field, v)).collect())
    })
}

/// Compiles `GET /users` parameters.
///
/// Results carry only `_id`, `name` and `userHandle`.
///
/// # Errors
///
/// Returns [`Error::Validation`](crate::Error::Validation) if any `id` entry
/// is not a record identifier.
pub fn build_user_query(params: &UserQueryParams) -> Result<CompiledQuery> {
    let by_name = params.order_by.as_deref() == Some("name");
    let direction = if flag(params.ascending.as_deref()) {
        Direction::Ascending
    } else {
        Direction::Descending
    };
    let (primary, secondary) = if by_name {
        (fields::NAME, fields::HANDLE)
    } else {
        (fields::HANDLE, fields::NAME)
    };
    let options = FindOptions::new()
        .sort(Sort::by(primary, direction).then(secondary, direction))
        .projection([fields::NAME, fields::HANDLE]);

    if let Some(raw) = params.id.as_deref() {
        let ids = parse_id_list(raw, "user")?;
        if !ids.is_empty() {
            let limit = ids.len();
            return Ok(CompiledQuery {
                filter: Filter::is_in(fields::ID, ids),
                options: options.limit(limit),
            });
        }
    }

    let mut clauses = Vec::new();
    if let Some(raw) = params.name.as_deref() {
        clauses.extend(match_any(fields::NAME, raw, flag(params.name_exact.as_deref())));
    }
    if let Some(raw) = params.user_handle.as_deref() {
        clauses.extend(match_any(
            fields::HANDLE,
            raw,
            flag(params.user_handle_exact.as_deref()),
        ));
    }
    if let Some(lt) = non_empty(params.lt.as_deref()) {
        clauses.push(Filter::lt(primary, lt));
    }
    if let Some(gt) = non_empty(params.gt.as_deref()) {
        clauses.push(Filter::gt(primary, gt));
    }

    let limit = params
        .limit
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&n| n >= 1)
        .map_or(USER_QUERY_LIMIT, |n| {
            usize::try_from(n).map_or(USER_QUERY_LIMIT, |n| n.min(USER_QUERY_LIMIT))
        });

    Ok(CompiledQuery {
        filter: Filter::And(clauses),
        options: options.limit(limit),
    })
}
