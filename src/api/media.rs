//! Media API endpoints
//!
//! Only metadata is handled here; file bytes live wherever `path` points.
//! - POST /api/v1/articles/{id}/media - Attach media to an article
//! - DELETE /api/v1/media/{id} - Remove a media record

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::delete,
    Json, Router,
};

use crate::api::middleware::{parse_id, ApiError, AppState};
use crate::models::{CreateMediaInput, MediaFile};

/// Build the media router
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", delete(remove_media))
}

/// POST /api/v1/articles/{id}/media
pub async fn attach_media(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
    Json(body): Json<CreateMediaInput>,
) -> Result<(StatusCode, Json<MediaFile>), ApiError> {
    let article_id = parse_id(&article_id)?;

    let media = state.article_service.attach_media(article_id, body).await?;

    Ok((StatusCode::CREATED, Json(media)))
}

/// DELETE /api/v1/media/{id}
pub async fn remove_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    state.article_service.remove_media(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
