//! Range-aware file download and streaming.
//!
//! The two endpoints share all logic and differ only in the default
//! Content-Disposition: `download` serves `attachment`, `stream` serves
//! `inline`. A `disposition` query parameter overrides either.
//!
//! Header policy: `Accept-Ranges: bytes` is always advertised.
//! `Content-Length` is set only on full (non-ranged) responses; ranged
//! responses carry the length implicitly in `Content-Range`.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use mediavault_core::models::StoredFile;
use mediavault_core::AppError;

use crate::auth::{AuthContext, UserRole};
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::content_disposition::content_disposition;
use crate::utils::range::{evaluate_range, RangeOutcome};

#[derive(Debug, Deserialize)]
pub struct DispositionQuery {
    pub disposition: Option<String>,
}

fn resolve_disposition(query: &DispositionQuery, default: &str) -> Result<String, AppError> {
    match query.disposition.as_deref() {
        None => Ok(default.to_string()),
        Some("inline") => Ok("inline".to_string()),
        Some("attachment") => Ok("attachment".to_string()),
        Some(other) => Err(AppError::InvalidInput(format!(
            "disposition must be 'inline' or 'attachment', got '{}'",
            other
        ))),
    }
}

/// Fetch a file the caller may access, or the right 404/403. Files follow the
/// tenant rule (admin or same tenant); the uploader carve-out is video-only.
pub(crate) async fn load_file(
    state: &Arc<AppState>,
    auth: &AuthContext,
    id: Uuid,
) -> Result<StoredFile, AppError> {
    let file = state
        .media
        .file_repository
        .get_by_id_unchecked(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
    if auth.role != UserRole::Admin && file.tenant_id != auth.tenant_id {
        return Err(AppError::Forbidden(
            "You do not have access to this file".to_string(),
        ));
    }
    Ok(file)
}

async fn serve_file(
    state: Arc<AppState>,
    auth: AuthContext,
    id: Uuid,
    headers: HeaderMap,
    query: DispositionQuery,
    default_disposition: &str,
) -> Result<Response, HttpAppError> {
    let disposition = resolve_disposition(&query, default_disposition)?;
    let file = load_file(&state, &auth, id).await?;
    let total = file.size as u64;

    let range_header = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());

    let mut builder = Response::builder()
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, &file.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&disposition, &file.filename),
        );
    if let Some(encoding) = &file.content_encoding {
        builder = builder.header(header::CONTENT_ENCODING, encoding);
    }

    let response = match evaluate_range(range_header, total) {
        RangeOutcome::Full => {
            let stream = state
                .media
                .storage
                .download_stream(&file.storage_key)
                .await
                .map_err(HttpAppError::from)?;
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, total)
                .body(Body::from_stream(
                    stream.map(|chunk| chunk.map_err(std::io::Error::other)),
                ))
        }
        RangeOutcome::Partial { start, end } => {
            let length = end - start + 1;
            let stream = state
                .media
                .storage
                .download_range(&file.storage_key, start, Some(length))
                .await
                .map_err(HttpAppError::from)?;
            tracing::debug!(
                file_id = %file.id,
                start = start,
                end = end,
                total = total,
                "Serving partial content"
            );
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, total),
                )
                .body(Body::from_stream(
                    stream.map(|chunk| chunk.map_err(std::io::Error::other)),
                ))
        }
        RangeOutcome::Unsatisfiable => builder
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{}", total))
            .body(Body::empty()),
    };

    response
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}

#[utoipa::path(
    get,
    path = "/api/v0/files/{id}/download",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File id"),
        ("disposition" = Option<String>, Query, description = "'inline' or 'attachment', defaults to attachment")
    ),
    responses(
        (status = 200, description = "Full file"),
        (status = 206, description = "Requested byte range"),
        (status = 403, description = "Wrong tenant", body = crate::error::ErrorResponse),
        (status = 404, description = "No such file", body = crate::error::ErrorResponse),
        (status = 416, description = "Range starts past end of file")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, headers, query), fields(tenant_id = %auth.tenant_id, file_id = %id))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<DispositionQuery>,
) -> Result<Response, HttpAppError> {
    serve_file(state, auth, id, headers, query, "attachment").await
}

#[utoipa::path(
    get,
    path = "/api/v0/files/stream/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File id"),
        ("disposition" = Option<String>, Query, description = "'inline' or 'attachment', defaults to inline")
    ),
    responses(
        (status = 200, description = "Full file"),
        (status = 206, description = "Requested byte range"),
        (status = 403, description = "Wrong tenant", body = crate::error::ErrorResponse),
        (status = 404, description = "No such file", body = crate::error::ErrorResponse),
        (status = 416, description = "Range starts past end of file")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, headers, query), fields(tenant_id = %auth.tenant_id, file_id = %id))]
pub async fn stream_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<DispositionQuery>,
) -> Result<Response, HttpAppError> {
    serve_file(state, auth, id, headers, query, "inline").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_defaults_and_overrides() {
        let none = DispositionQuery { disposition: None };
        assert_eq!(resolve_disposition(&none, "attachment").unwrap(), "attachment");
        assert_eq!(resolve_disposition(&none, "inline").unwrap(), "inline");

        let inline = DispositionQuery {
            disposition: Some("inline".to_string()),
        };
        assert_eq!(resolve_disposition(&inline, "attachment").unwrap(), "inline");

        let bad = DispositionQuery {
            disposition: Some("download".to_string()),
        };
        assert!(resolve_disposition(&bad, "attachment").is_err());
    }
}
