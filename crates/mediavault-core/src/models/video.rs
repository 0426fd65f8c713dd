use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A video's domain-specific metadata, one-to-one with a [`super::StoredFile`].
///
/// `duration`, `format` and `resolution` stay empty until the metadata
/// extraction job runs; `thumbnail_key`/`thumbnail_url` stay empty until the
/// thumbnail job runs. A record with all of them absent is valid and expected
/// immediately after upload. The two jobs patch disjoint column subsets and
/// are not ordered relative to each other.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoAsset {
    pub id: Uuid,
    pub file_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<f64>,
    pub format: Option<String>,
    pub resolution: Option<String>,
    pub uploaded_by: Uuid,
    pub tenant_id: Uuid,
    pub thumbnail_key: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Video summary returned by the API: the asset plus its file's location data
#[derive(Debug, Serialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub file_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<f64>,
    pub format: Option<String>,
    pub resolution: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tenant_id: Uuid,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<VideoAsset> for VideoResponse {
    fn from(video: VideoAsset) -> Self {
        Self {
            id: video.id,
            file_id: video.file_id,
            title: video.title,
            description: video.description,
            duration: video.duration,
            format: video.format,
            resolution: video.resolution,
            thumbnail_url: video.thumbnail_url,
            tenant_id: video.tenant_id,
            uploaded_by: video.uploaded_by,
            created_at: video.created_at,
        }
    }
}

/// Returned by the thumbnail regeneration/upload endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ThumbnailResponse {
    pub video_id: Uuid,
    pub thumbnail_key: String,
    pub thumbnail_url: String,
}
