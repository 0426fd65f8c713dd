//! Thumbnail endpoints: synchronous regeneration, direct upload, and serving.
//!
//! All three operate on the video's deterministic thumbnail key, so a
//! regeneration or re-upload overwrites the previous image in place.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use mediavault_core::models::{ThumbnailResponse, VideoAsset};
use mediavault_core::AppError;
use mediavault_processing::{clamp_timestamp, default_timestamp};
use mediavault_storage::keys::thumbnail_key;
use mediavault_storage::StorageError;

use crate::auth::{AuthContext, UserRole};
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegenerateQuery {
    /// Capture point in seconds; defaults to the duration-based policy
    pub at: Option<f64>,
}

async fn load_video(
    state: &Arc<AppState>,
    auth: &AuthContext,
    id: Uuid,
) -> Result<VideoAsset, AppError> {
    let video = state
        .media
        .video_repository
        .get_by_id_unchecked(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    let allowed = auth.role == UserRole::Admin
        || video.tenant_id == auth.tenant_id
        || video.uploaded_by == auth.user_id;
    if !allowed {
        return Err(AppError::Forbidden(
            "You do not have access to this video".to_string(),
        ));
    }
    Ok(video)
}

/// Store a thumbnail image and patch the video record with its location
async fn store_thumbnail(
    state: &Arc<AppState>,
    video: &VideoAsset,
    image: Vec<u8>,
) -> Result<ThumbnailResponse, AppError> {
    let key = thumbnail_key(video.tenant_id, video.id);
    let url = state
        .media
        .storage
        .upload_with_key(&key, image, "image/jpeg")
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    state
        .media
        .video_repository
        .update_thumbnail(video.id, &key, &url)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(ThumbnailResponse {
        video_id: video.id,
        thumbnail_key: key,
        thumbnail_url: url,
    })
}

#[utoipa::path(
    post,
    path = "/api/v0/videos/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Video id"),
        ("at" = Option<f64>, Query, description = "Capture point in seconds, clamped to the video duration")
    ),
    responses(
        (status = 200, description = "Thumbnail regenerated", body = ThumbnailResponse),
        (status = 404, description = "No such video", body = crate::error::ErrorResponse),
        (status = 500, description = "Frame extraction failed", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(tenant_id = %auth.tenant_id, video_id = %id))]
pub async fn regenerate_thumbnail(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Query(query): Query<RegenerateQuery>,
) -> Result<Json<ThumbnailResponse>, HttpAppError> {
    let video = load_video(&state, &auth, id).await?;
    let file = state
        .media
        .file_repository
        .get_by_id_unchecked(video.file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File record missing for video".to_string()))?;

    let data = state
        .media
        .storage
        .download(&file.storage_key)
        .await
        .map_err(HttpAppError::from)?;

    let timestamp = match query.at {
        Some(at) => clamp_timestamp(at, video.duration),
        None => default_timestamp(video.duration),
    };

    let frame = state
        .media
        .thumbnailer
        .extract_frame(&data, timestamp)
        .await
        .map_err(|e| AppError::MediaProcessing(format!("Frame extraction failed: {}", e)))?;

    let response = store_thumbnail(&state, &video, frame).await?;
    tracing::info!(video_id = %id, timestamp = timestamp, "Thumbnail regenerated");
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v0/videos/{id}/thumbnail/upload",
    tag = "thumbnails",
    params(("id" = Uuid, Path, description = "Video id")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail replaced with the uploaded image", body = ThumbnailResponse),
        (status = 400, description = "Missing or non-image field", body = crate::error::ErrorResponse),
        (status = 404, description = "No such video", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(tenant_id = %auth.tenant_id, video_id = %id))]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ThumbnailResponse>, HttpAppError> {
    let video = load_video(&state, &auth, id).await?;

    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            if !content_type.starts_with("image/") {
                return Err(AppError::InvalidInput(format!(
                    "Expected an image content type, got '{}'",
                    content_type
                ))
                .into());
            }
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read image field: {}", e)))?;
            image = Some(data.to_vec());
        }
    }

    let image = image.ok_or_else(|| AppError::InvalidInput("Missing 'image' file field".into()))?;
    if image.is_empty() {
        return Err(AppError::InvalidInput("Image file is empty".into()).into());
    }

    let response = store_thumbnail(&state, &video, image).await?;
    tracing::info!(video_id = %id, "Thumbnail uploaded");
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}/thumbnail",
    tag = "thumbnails",
    params(("id" = Uuid, Path, description = "Video id")),
    responses(
        (status = 200, description = "Thumbnail image", content_type = "image/jpeg"),
        (status = 404, description = "No thumbnail generated yet", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(tenant_id = %auth.tenant_id, video_id = %id))]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    let video = load_video(&state, &auth, id).await?;

    // Records written before the thumbnail job finished carry no key yet, but
    // the blob may already exist at the deterministic location.
    let key = video
        .thumbnail_key
        .unwrap_or_else(|| thumbnail_key(video.tenant_id, video.id));

    let size = match state.media.storage.content_length(&key).await {
        Ok(size) => size,
        Err(StorageError::NotFound(_)) => {
            return Err(AppError::NotFound("No thumbnail generated yet".to_string()).into())
        }
        Err(e) => return Err(e.into()),
    };
    let stream = state
        .media
        .storage
        .download_stream(&key)
        .await
        .map_err(HttpAppError::from)?;
    let body = Body::from_stream(stream.map(|chunk| chunk.map_err(std::io::Error::other)));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CONTENT_LENGTH, size)
        .header(header::CONTENT_DISPOSITION, "inline")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
