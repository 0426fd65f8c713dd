//! Video upload orchestration.
//!
//! The request path runs the ffmpeg transforms, writes the blob, creates the
//! file and video rows, and enqueues both background jobs before responding.
//! The response never waits on job completion; metadata and thumbnail fields
//! arrive asynchronously. An enqueue failure fails the whole upload, since a
//! video row with no queued jobs would never get its metadata filled in.

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use mediavault_core::models::{
    FileResponse, Task, TaskType, VideoMetadataPayload, VideoResponse, VideoThumbnailPayload,
};
use mediavault_core::AppError;

use crate::auth::AuthContext;
use crate::error::HttpAppError;
use crate::state::AppState;

/// Default task priority for upload-triggered jobs
const UPLOAD_JOB_PRIORITY: i32 = 5;

#[derive(Serialize, ToSchema)]
pub struct VideoUploadResponse {
    pub file: FileResponse,
    pub video: VideoResponse,
}

struct UploadFields {
    data: Vec<u8>,
    filename: String,
    content_type: String,
    title: Option<String>,
    description: Option<String>,
}

async fn read_multipart(mut multipart: Multipart) -> Result<UploadFields, AppError> {
    let mut video: Option<(Vec<u8>, String, String)> = None;
    let mut title = None;
    let mut description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "video" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidInput("Video field has no filename".into()))?;
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read video field: {}", e)))?;
                video = Some((data.to_vec(), filename, content_type));
            }
            "title" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read title: {}", e)))?;
                if !text.trim().is_empty() {
                    title = Some(text);
                }
            }
            "description" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read description: {}", e))
                })?;
                if !text.trim().is_empty() {
                    description = Some(text);
                }
            }
            _ => {}
        }
    }

    let (data, filename, content_type) =
        video.ok_or_else(|| AppError::InvalidInput("Missing 'video' file field".into()))?;
    if data.is_empty() {
        return Err(AppError::InvalidInput("Video file is empty".into()));
    }
    if !content_type.starts_with("video/") {
        return Err(AppError::InvalidInput(format!(
            "Expected a video content type, got '{}'",
            content_type
        )));
    }

    Ok(UploadFields {
        data,
        filename,
        content_type,
        title,
        description,
    })
}

/// Title fallback when the uploader supplies none: filename stem
fn title_from_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded; metadata and thumbnail arrive asynchronously", body = VideoUploadResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 500, description = "Storage, database, or queue failure", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, headers, multipart), fields(tenant_id = %auth.tenant_id, user_id = %auth.user_id))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<VideoUploadResponse>), HttpAppError> {
    let fields = read_multipart(multipart).await?;
    let original_size = fields.data.len();

    // Faststart runs unconditionally so playback can begin mid-download.
    // A transform failure fails the upload rather than storing raw bytes.
    let data = state
        .media
        .transcoder
        .faststart(&fields.data)
        .await
        .map_err(|e| AppError::MediaProcessing(format!("Faststart remux failed: {}", e)))?;

    let data = if data.len() as u64 > state.media.video_compression_threshold_bytes {
        state
            .media
            .transcoder
            .compress(&data)
            .await
            .map_err(|e| AppError::MediaProcessing(format!("Video re-encode failed: {}", e)))?
    } else {
        data
    };

    let size = data.len() as i64;
    let (storage_key, storage_url) = state
        .media
        .storage
        .upload(auth.tenant_id, &fields.filename, &fields.content_type, data)
        .await
        .map_err(HttpAppError::from)?;

    let uploader_ip = client_ip(&headers);
    let file = match state
        .media
        .file_repository
        .create(
            &fields.filename,
            &storage_key,
            &storage_url,
            size,
            &fields.content_type,
            None,
            auth.user_id,
            auth.tenant_id,
            uploader_ip.as_deref(),
        )
        .await
    {
        Ok(file) => file,
        Err(e) => {
            cleanup_blob(&state, storage_key);
            return Err(e.into());
        }
    };

    let title = fields
        .title
        .unwrap_or_else(|| title_from_filename(&fields.filename));
    let video = match state
        .media
        .video_repository
        .create(
            file.id,
            &title,
            fields.description.as_deref(),
            auth.user_id,
            auth.tenant_id,
        )
        .await
    {
        Ok(video) => video,
        Err(e) => {
            cleanup_rows_and_blob(&state, auth.tenant_id, file.id, storage_key);
            return Err(e.into());
        }
    };

    // Persist-then-enqueue: both rows are durable before either job exists.
    // Payloads carry the storage key so workers re-fetch bytes themselves.
    let metadata_payload = Task::payload_from(&VideoMetadataPayload {
        video_id: video.id,
        storage_key: storage_key.clone(),
    });
    let thumbnail_payload = Task::payload_from(&VideoThumbnailPayload {
        video_id: video.id,
        tenant_id: auth.tenant_id,
        storage_key: storage_key.clone(),
    });

    let enqueued = async {
        state
            .tasks
            .task_queue
            .submit_task(
                auth.tenant_id,
                TaskType::ExtractVideoMetadata,
                metadata_payload,
                UPLOAD_JOB_PRIORITY,
            )
            .await?;
        state
            .tasks
            .task_queue
            .submit_task(
                auth.tenant_id,
                TaskType::GenerateVideoThumbnail,
                thumbnail_payload,
                UPLOAD_JOB_PRIORITY,
            )
            .await?;
        Ok::<_, anyhow::Error>(())
    }
    .await;

    if let Err(e) = enqueued {
        // Without its jobs the video would sit with empty metadata forever,
        // so the upload fails as a whole and the partial state is removed.
        // Deleting the file row cascades to the video row.
        cleanup_rows_and_blob(&state, auth.tenant_id, file.id, storage_key);
        return Err(AppError::Queue(format!("Failed to enqueue processing jobs: {}", e)).into());
    }

    tracing::info!(
        video_id = %video.id,
        file_id = %file.id,
        original_size = original_size,
        stored_size = size,
        "Video uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(VideoUploadResponse {
            file: file.into(),
            video: video.into(),
        }),
    ))
}

fn cleanup_blob(state: &Arc<AppState>, storage_key: String) {
    let storage = state.media.storage.clone();
    tokio::spawn(async move {
        if let Err(e) = storage.delete(&storage_key).await {
            tracing::warn!(error = %e, storage_key = %storage_key, "Failed to clean up blob after aborted upload");
        }
    });
}

fn cleanup_rows_and_blob(state: &Arc<AppState>, tenant_id: uuid::Uuid, file_id: uuid::Uuid, storage_key: String) {
    let files = state.media.file_repository.clone();
    let storage = state.media.storage.clone();
    tokio::spawn(async move {
        if let Err(e) = files.delete(tenant_id, file_id).await {
            tracing::warn!(error = %e, file_id = %file_id, "Failed to clean up file row after aborted upload");
        }
        if let Err(e) = storage.delete(&storage_key).await {
            tracing::warn!(error = %e, storage_key = %storage_key, "Failed to clean up blob after aborted upload");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_defaults_to_filename_stem() {
        assert_eq!(title_from_filename("demo.mp4"), "demo");
        assert_eq!(title_from_filename("my.movie.mp4"), "my.movie");
        assert_eq!(title_from_filename("noextension"), "noextension");
        assert_eq!(title_from_filename(".hidden"), ".hidden");
    }

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("203.0.113.9".to_string()));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
