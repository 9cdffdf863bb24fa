//! Image handlers.
//!
//! Reads resolve the caller permissively; writes require a session.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::debug;

use super::super::extract::{Authenticated, Visitor};
use super::super::types::InsertResponse;
use super::super::{AppError, AppState, metrics};
use super::image_id;
use crate::access::{AclEdit, AclOutcome, ImageQueryParams, Upload};
use crate::model::ImageView;

/// GET /images - Query image metadata visible to the caller.
pub(crate) async fn query_images(
    State(state): State<AppState>,
    Visitor(caller): Visitor,
    Query(params): Query<ImageQueryParams>,
) -> Result<Json<Vec<ImageView>>, AppError> {
    metrics::record_image_operation("query");
    let images = state.reader.query_metadata(&params, caller.as_ref()).await?;
    Ok(Json(images))
}

/// GET /images/{id}/content - Fetch image bytes.
pub(crate) async fn get_content(
    State(state): State<AppState>,
    Visitor(caller): Visitor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    metrics::record_image_operation("content");
    let id = image_id(&id)?;
    let content = state.reader.fetch_content(&id, caller.as_ref()).await?;
    Ok(([(header::CONTENT_TYPE, content.content_type)], content.data))
}

/// POST /images - Upload an image (multipart form).
///
/// Fields: `file` (required), `accessLevel`, `accessListIDs` (JSON array),
/// `caption`. Unknown fields are ignored.
pub(crate) async fn upload_image(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    mut multipart: Multipart,
) -> Result<Json<InsertResponse>, AppError> {
    metrics::record_image_operation("upload");

    let mut upload = Upload::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                upload.content_type = field.content_type().map(str::to_string);
                upload.data = field.bytes().await?;
                has_file = true;
            },
            Some("accessLevel") => upload.access_level = Some(field.text().await?),
            Some("accessListIDs") => upload.access_list = Some(field.text().await?),
            Some("caption") => upload.caption = field.text().await?,
            other => debug!(field = ?other, "Ignoring unknown upload field"),
        }
    }

    if !has_file {
        return Err(AppError::BadRequest("Error parsing file".to_string()));
    }

    let size = upload.data.len();
    let id = state.mutations.create(&caller, upload).await?;
    metrics::record_upload_bytes(size);
    Ok(Json(InsertResponse { id }))
}

/// PATCH /images/{id}/likes - Like an image.
pub(crate) async fn like_image(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    metrics::record_image_operation("like");
    let id = image_id(&id)?;
    state.mutations.like(&caller, &id).await?;
    Ok(StatusCode::OK)
}

/// DELETE /images/{id}/likes - Unlike an image.
pub(crate) async fn unlike_image(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    metrics::record_image_operation("unlike");
    let id = image_id(&id)?;
    state.mutations.unlike(&caller, &id).await?;
    Ok(StatusCode::OK)
}

/// PATCH /images/{id}/acl - Grant and revoke access. Owner only.
pub(crate) async fn edit_acl(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<AclEdit>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    metrics::record_image_operation("acl");
    let id = image_id(&id)?;
    let Json(edit) = body?;
    match state.mutations.edit_acl(&caller, &id, &edit).await? {
        AclOutcome::Updated => Ok(StatusCode::OK),
        AclOutcome::Unchanged => Ok(StatusCode::NO_CONTENT),
    }
}

/// DELETE /images/{id} - Delete an image and its content. Owner only.
pub(crate) async fn delete_image(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    metrics::record_image_operation("delete");
    let id = image_id(&id)?;
    state.mutations.delete(&caller, &id).await?;
    Ok(StatusCode::OK)
}
