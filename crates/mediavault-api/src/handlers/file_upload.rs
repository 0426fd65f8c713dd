//! Generic (non-video) file upload, listing, rename, and delete.
//!
//! Compressible payloads over the configured threshold are gzip-compressed
//! before the blob write; the encoding is recorded on the file row and echoed
//! as `Content-Encoding` when the file is served. Video uploads go through
//! the dedicated video endpoint instead.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use mediavault_core::models::FileResponse;
use mediavault_core::AppError;
use mediavault_processing::{gzip_compress, should_compress};

use crate::auth::AuthContext;
use crate::error::HttpAppError;
use crate::handlers::file_stream::load_file;
use crate::handlers::video::ListQuery;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/files",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Missing file field", body = crate::error::ErrorResponse),
        (status = 500, description = "Storage or database failure", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(tenant_id = %auth.tenant_id, user_id = %auth.user_id))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), HttpAppError> {
    let mut upload: Option<(Vec<u8>, String, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::InvalidInput("File field has no filename".into()))?;
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file field: {}", e)))?;
            upload = Some((data.to_vec(), filename, content_type));
        }
    }

    let (data, filename, content_type) =
        upload.ok_or_else(|| AppError::InvalidInput("Missing 'file' file field".into()))?;
    if data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".into()).into());
    }
    let original_size = data.len();

    let threshold = state.media.file_compression_threshold_bytes as usize;
    let (data, content_encoding) = if should_compress(&content_type, data.len(), threshold) {
        let compressed = gzip_compress(&data)
            .map_err(|e| AppError::MediaProcessing(format!("Compression failed: {}", e)))?;
        (compressed, Some("gzip"))
    } else {
        (data, None)
    };

    let size = data.len() as i64;
    let (storage_key, storage_url) = state
        .media
        .storage
        .upload(auth.tenant_id, &filename, &content_type, data)
        .await
        .map_err(HttpAppError::from)?;

    let file = match state
        .media
        .file_repository
        .create(
            &filename,
            &storage_key,
            &storage_url,
            size,
            &content_type,
            content_encoding,
            auth.user_id,
            auth.tenant_id,
            None,
        )
        .await
    {
        Ok(file) => file,
        Err(e) => {
            let storage = state.media.storage.clone();
            tokio::spawn(async move {
                if let Err(cleanup_err) = storage.delete(&storage_key).await {
                    tracing::warn!(error = %cleanup_err, storage_key = %storage_key, "Failed to clean up blob after aborted upload");
                }
            });
            return Err(e.into());
        }
    };

    tracing::info!(
        file_id = %file.id,
        original_size = original_size,
        stored_size = size,
        compressed = content_encoding.is_some(),
        "File uploaded"
    );

    Ok((StatusCode::CREATED, Json(file.into())))
}

#[utoipa::path(
    get,
    path = "/api/v0/files",
    tag = "files",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, max 200"),
        ("offset" = Option<i64>, Query, description = "Rows to skip")
    ),
    responses((status = 200, description = "Files, newest first", body = [FileResponse])),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(tenant_id = %auth.tenant_id))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FileResponse>>, HttpAppError> {
    let (limit, offset) = query.page();
    let files = state
        .media
        .file_repository
        .list(auth.tenant_id, limit, offset)
        .await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameFileRequest {
    pub filename: String,
}

fn validate_filename(filename: &str) -> Result<&str, AppError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Filename cannot be empty".into()));
    }
    if trimmed.len() > 255 {
        return Err(AppError::InvalidInput(
            "Filename cannot exceed 255 characters".into(),
        ));
    }
    Ok(trimmed)
}

#[utoipa::path(
    put,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    request_body = RenameFileRequest,
    responses(
        (status = 200, description = "Renamed file", body = FileResponse),
        (status = 400, description = "Empty or oversized filename", body = crate::error::ErrorResponse),
        (status = 403, description = "Wrong tenant", body = crate::error::ErrorResponse),
        (status = 404, description = "No such file", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(tenant_id = %auth.tenant_id, file_id = %id))]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<RenameFileRequest>,
) -> Result<Json<FileResponse>, HttpAppError> {
    let filename = validate_filename(&request.filename)?;
    let file = load_file(&state, &auth, id).await?;

    let renamed = state
        .media
        .file_repository
        .update_filename(file.tenant_id, file.id, filename)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    tracing::info!(file_id = %id, filename = %filename, "File renamed");
    Ok(Json(renamed.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 204, description = "File record, dependent video, and blobs removed"),
        (status = 403, description = "Wrong tenant", body = crate::error::ErrorResponse),
        (status = 404, description = "No such file", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(tenant_id = %auth.tenant_id, file_id = %id))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let file = load_file(&state, &auth, id).await?;

    // A video row backed by this file goes with it (the foreign key cascades),
    // so its thumbnail blob has to be collected before the row disappears.
    let thumbnail_key = state
        .media
        .video_repository
        .get_by_file_id(file.id)
        .await?
        .and_then(|video| video.thumbnail_key);

    // Row deletes first; the delete is not atomic across the database and the
    // blob store, and a leftover blob is preferable to a row pointing at a
    // deleted blob. Blob-delete failures are logged, not surfaced.
    let deleted = state
        .media
        .file_repository
        .delete(file.tenant_id, file.id)
        .await?;

    let storage = state.media.storage.clone();
    tokio::spawn(async move {
        if let Some(file) = deleted {
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

    tracing::info!(file_id = %id, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_validation_trims_and_rejects_empty() {
        assert_eq!(validate_filename("  report.pdf  ").unwrap(), "report.pdf");
        assert!(validate_filename("").is_err());
        assert!(validate_filename("   ").is_err());
    }

    #[test]
    fn filename_validation_rejects_oversized() {
        let long = "a".repeat(256);
        assert!(validate_filename(&long).is_err());
        let max = "a".repeat(255);
        assert_eq!(validate_filename(&max).unwrap(), max);
    }
}
