use mediavault_core::models::VideoAsset;
use mediavault_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const VIDEO_COLUMNS: &str = "id, file_id, title, description, duration, format, resolution, uploaded_by, tenant_id, thumbnail_key, thumbnail_url, created_at";

/// Repository for video asset records
///
/// Metadata and thumbnail patches each touch a disjoint column subset in a
/// single UPDATE, so the extraction and thumbnail jobs can land in any order.
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a video record pointing at an existing file row
    #[tracing::instrument(skip(self, description), fields(db.table = "videos", db.operation = "insert"))]
    pub async fn create(
        &self,
        file_id: Uuid,
        title: &str,
        description: Option<&str>,
        uploaded_by: Uuid,
        tenant_id: Uuid,
    ) -> Result<VideoAsset, AppError> {
        let video = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            r#"
            INSERT INTO videos (file_id, title, description, uploaded_by, tenant_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(file_id)
        .bind(title)
        .bind(description)
        .bind(uploaded_by)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(video)
    }

    /// Get video by ID (tenant-scoped)
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VideoAsset>, AppError> {
        let video = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE tenant_id = $1 AND id = $2",
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Get video by ID without tenant scoping. Background workers only.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id_unchecked(&self, id: Uuid) -> Result<Option<VideoAsset>, AppError> {
        let video = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Get the video backed by a given file row, if any. Used by file deletion
    /// to find dependent rows and their thumbnail blobs.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn get_by_file_id(&self, file_id: Uuid) -> Result<Option<VideoAsset>, AppError> {
        let video = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE file_id = $1",
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// List videos for a tenant, newest first
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoAsset>, AppError> {
        let videos = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE tenant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        ))
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// List videos across all tenants, newest first. Admin listings only.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<VideoAsset>, AppError> {
        let videos = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Patch probe-derived columns. Idempotent: re-running the extraction job
    /// overwrites with the same values.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn update_probe_metadata(
        &self,
        id: Uuid,
        duration: Option<f64>,
        format: Option<&str>,
        resolution: Option<&str>,
    ) -> Result<Option<VideoAsset>, AppError> {
        let video = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            r#"
            UPDATE videos
            SET duration = $2, format = $3, resolution = $4
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(duration)
        .bind(format)
        .bind(resolution)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Patch thumbnail columns after a thumbnail blob has been stored
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn update_thumbnail(
        &self,
        id: Uuid,
        thumbnail_key: &str,
        thumbnail_url: &str,
    ) -> Result<Option<VideoAsset>, AppError> {
        let video = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            r#"
            UPDATE videos
            SET thumbnail_key = $2, thumbnail_url = $3
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(thumbnail_key)
        .bind(thumbnail_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Delete a video record, returning it so the caller can clean up blobs.
    /// The file row is deleted separately; the FK cascade covers the reverse
    /// direction only.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VideoAsset>, AppError> {
        let video = sqlx::query_as::<Postgres, VideoAsset>(&format!(
            "DELETE FROM videos WHERE tenant_id = $1 AND id = $2 RETURNING {VIDEO_COLUMNS}",
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }
}
