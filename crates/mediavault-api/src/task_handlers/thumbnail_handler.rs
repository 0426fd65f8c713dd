use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use mediavault_core::models::{Task, VideoThumbnailPayload};
use mediavault_core::TaskError;
use mediavault_processing::default_timestamp;
use mediavault_storage::keys::thumbnail_key;

use super::TaskHandler;
use crate::state::AppState;

/// Captures a JPEG frame from an uploaded video and stores it at the video's
/// deterministic thumbnail key. Re-running overwrites the same blob, so the
/// handler is idempotent.
pub struct ThumbnailTaskHandler;

#[async_trait]
impl TaskHandler for ThumbnailTaskHandler {
    #[tracing::instrument(skip(self, task, state), fields(task.id = %task.id, video.id = tracing::field::Empty))]
    async fn process(&self, task: &Task, state: Arc<AppState>) -> Result<serde_json::Value> {
        let payload: VideoThumbnailPayload = task
            .try_payload_as()
            .map_err(|e| TaskError::Unrecoverable(anyhow::anyhow!("Malformed payload: {}", e)))?;

        tracing::Span::current().record("video.id", payload.video_id.to_string());

        let video = match state
            .media
            .video_repository
            .get_by_id_unchecked(payload.video_id)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?
        {
            Some(video) => video,
            None => {
                tracing::info!(video_id = %payload.video_id, "Video no longer exists, skipping");
                return Ok(json!({
                    "status": "skipped",
                    "reason": "video not found",
                    "video_id": payload.video_id,
                }));
            }
        };

        let data = state
            .media
            .storage
            .download(&payload.storage_key)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to download video bytes: {}", e))?;

        // Metadata extraction may not have run yet; if so probe here so the
        // capture point lands inside the video.
        let duration = match video.duration {
            Some(d) => Some(d),
            None => state
                .media
                .probe
                .probe(&data)
                .await
                .map(|m| m.duration)
                .unwrap_or(None),
        };
        let timestamp = default_timestamp(duration);

        let frame = state
            .media
            .thumbnailer
            .extract_frame(&data, timestamp)
            .await
            .context("Thumbnail extraction failed")?;

        let key = thumbnail_key(payload.tenant_id, video.id);
        let url = state
            .media
            .storage
            .upload_with_key(&key, frame, "image/jpeg")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store thumbnail: {}", e))?;

        let updated = state
            .media
            .video_repository
            .update_thumbnail(video.id, &key, &url)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        if updated.is_none() {
            tracing::info!(video_id = %video.id, "Video deleted mid-task, thumbnail orphaned");
            return Ok(json!({
                "status": "skipped",
                "reason": "video not found",
                "video_id": video.id,
            }));
        }

        tracing::info!(
            video_id = %video.id,
            thumbnail_key = %key,
            timestamp = timestamp,
            "Thumbnail generated"
        );

        Ok(json!({
            "status": "success",
            "video_id": video.id,
            "thumbnail_key": key,
            "thumbnail_url": url,
            "timestamp": timestamp,
        }))
    }
}
