use mediavault_core::models::StoredFile;
use mediavault_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const FILE_COLUMNS: &str = "id, filename, storage_key, storage_url, size, content_type, content_encoding, user_id, tenant_id, uploader_ip, created_at";

/// Repository for stored file records
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a file record after its blob has been written to storage
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "insert"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        filename: &str,
        storage_key: &str,
        storage_url: &str,
        size: i64,
        content_type: &str,
        content_encoding: Option<&str>,
        user_id: Uuid,
        tenant_id: Uuid,
        uploader_ip: Option<&str>,
    ) -> Result<StoredFile, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(&format!(
            r#"
            INSERT INTO files (filename, storage_key, storage_url, size, content_type, content_encoding, user_id, tenant_id, uploader_ip)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(filename)
        .bind(storage_key)
        .bind(storage_url)
        .bind(size)
        .bind(content_type)
        .bind(content_encoding)
        .bind(user_id)
        .bind(tenant_id)
        .bind(uploader_ip)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    /// Get file by ID (tenant-scoped)
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<StoredFile>, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE tenant_id = $1 AND id = $2",
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// Get file by ID without tenant scoping. Background workers only; access
    /// decisions for request paths go through `get_by_id`.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id_unchecked(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// List files for a tenant, newest first
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredFile>, AppError> {
        let files = sqlx::query_as::<Postgres, StoredFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE tenant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        ))
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    /// Rename a file record (tenant-scoped). Only the display filename
    /// changes; the storage key keeps the name the blob was written under.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    pub async fn update_filename(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        filename: &str,
    ) -> Result<Option<StoredFile>, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(&format!(
            r#"
            UPDATE files
            SET filename = $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// Delete a file record. Returns the deleted row so the caller can remove
    /// the blob from storage afterwards.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<StoredFile>, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(&format!(
            "DELETE FROM files WHERE tenant_id = $1 AND id = $2 RETURNING {FILE_COLUMNS}",
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }
}
