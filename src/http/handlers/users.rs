//! User directory handler.

use axum::{
    Json,
    extract::{Query, State},
};

use super::super::{AppError, AppState};
use crate::access::UserQueryParams;
use crate::model::UserSummary;

/// GET /users - Search users by id, name or handle.
pub(crate) async fn query_users(
    State(state): State<AppState>,
    Query(params): Query<UserQueryParams>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state.reader.query_users(&params).await?;
    Ok(Json(users))
}
