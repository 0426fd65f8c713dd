//! Video read, list, and delete endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use mediavault_core::models::{FileResponse, VideoAsset, VideoResponse};
use mediavault_core::AppError;

use crate::auth::{AuthContext, UserRole};
use crate::error::HttpAppError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub(crate) fn page(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Serialize, ToSchema)]
pub struct VideoDetailResponse {
    pub video: VideoResponse,
    pub file: FileResponse,
}

/// Spec'd access rule for a single video: same tenant, admin, or the uploader.
fn can_access(auth: &AuthContext, video: &VideoAsset) -> bool {
    auth.role == UserRole::Admin
        || video.tenant_id == auth.tenant_id
        || video.uploaded_by == auth.user_id
}

/// Fetch a video the caller may access, or the right 404/403.
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
    if !can_access(auth, &video) {
        return Err(AppError::Forbidden(
            "You do not have access to this video".to_string(),
        ));
    }
    Ok(video)
}

#[utoipa::path(
    get,
    path = "/api/v0/videos",
    tag = "videos",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, max 200"),
        ("offset" = Option<i64>, Query, description = "Rows to skip")
    ),
    responses((status = 200, description = "Videos, newest first", body = [VideoResponse])),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(tenant_id = %auth.tenant_id))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VideoResponse>>, HttpAppError> {
    let (limit, offset) = query.page();
    let videos = match auth.role {
        UserRole::Admin => state.media.video_repository.list_all(limit, offset).await?,
        UserRole::Member => {
            state
                .media
                .video_repository
                .list(auth.tenant_id, limit, offset)
                .await?
        }
    };
    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video with its file summary", body = VideoDetailResponse),
        (status = 403, description = "Wrong tenant", body = crate::error::ErrorResponse),
        (status = 404, description = "No such video", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(tenant_id = %auth.tenant_id, video_id = %id))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<VideoDetailResponse>, HttpAppError> {
    let video = load_video(&state, &auth, id).await?;
    let file = state
        .media
        .file_repository
        .get_by_id_unchecked(video.file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File record missing for video".to_string()))?;

    Ok(Json(VideoDetailResponse {
        video: video.into(),
        file: file.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video id")),
    responses(
        (status = 204, description = "Video, file record, and blobs removed"),
        (status = 403, description = "Wrong tenant", body = crate::error::ErrorResponse),
        (status = 404, description = "No such video", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(tenant_id = %auth.tenant_id, video_id = %id))]
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let video = load_video(&state, &auth, id).await?;

    // Row deletes first; the delete is not atomic across the database and the
    // blob store, and a leftover blob is preferable to a row pointing at a
    // deleted blob. Blob-delete failures are logged, not surfaced.
    let file = state
        .media
        .file_repository
        .delete(video.tenant_id, video.file_id)
        .await?;

    let storage = state.media.storage.clone();
    let thumbnail_key = video.thumbnail_key.clone();
    tokio::spawn(async move {
        if let Some(file) = file {
            if let Err(e) = storage.delete(&file.storage_key).await {
                tracing::warn!(error = %e, storage_key = %file.storage_key, "Failed to delete media blob");
            }
        }
        if let Some(key) = thumbnail_key {
            if let Err(e) = storage.delete(&key).await {
                tracing::warn!(error = %e, storage_key = %key, "Failed to delete thumbnail blob");
            }
        }
    });

    tracing::info!(video_id = %id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}
