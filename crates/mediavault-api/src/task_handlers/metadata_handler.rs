use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use mediavault_core::models::{Task, VideoMetadataPayload};
use mediavault_core::TaskError;

use super::TaskHandler;
use crate::state::AppState;

/// Probes an uploaded video and patches duration/format/resolution onto its
/// record. Partial probe output is fine; whatever ffprobe reported is stored.
pub struct MetadataTaskHandler;

#[async_trait]
impl TaskHandler for MetadataTaskHandler {
    #[tracing::instrument(skip(self, task, state), fields(task.id = %task.id, video.id = tracing::field::Empty))]
    async fn process(&self, task: &Task, state: Arc<AppState>) -> Result<serde_json::Value> {
        let payload: VideoMetadataPayload = task
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
                // The video was deleted between enqueue and execution
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

        let metadata = state
            .media
            .probe
            .probe(&data)
            .await
            .context("ffprobe failed")?;

        let updated = state
            .media
            .video_repository
            .update_probe_metadata(
                video.id,
                metadata.duration,
                metadata.format.as_deref(),
                metadata.resolution.as_deref(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        if updated.is_none() {
            tracing::info!(video_id = %video.id, "Video deleted mid-task, metadata discarded");
            return Ok(json!({
                "status": "skipped",
                "reason": "video not found",
                "video_id": video.id,
            }));
        }

        tracing::info!(
            video_id = %video.id,
            duration = ?metadata.duration,
            format = ?metadata.format,
            resolution = ?metadata.resolution,
            "Video metadata extracted"
        );

        Ok(json!({
            "status": "success",
            "video_id": video.id,
            "duration": metadata.duration,
            "format": metadata.format,
            "resolution": metadata.resolution,
        }))
    }
}
