use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One physical blob plus its ownership/location metadata.
///
/// The storage key is unique and tenant-scoped; tenant ownership never
/// transfers after creation. `size` is the stored blob's size, which differs
/// from the original upload when a compression transform was applied;
/// `content_encoding` records that transform (currently only `gzip`).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredFile {
    pub id: Uuid,
    pub filename: String,
    pub storage_key: String,
    pub storage_url: String,
    pub size: i64,
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub uploader_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// File summary returned by upload and read endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub filename: String,
    pub storage_url: String,
    pub size: i64,
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<StoredFile> for FileResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            storage_url: file.storage_url,
            size: file.size,
            content_type: file.content_type,
            content_encoding: file.content_encoding,
            tenant_id: file.tenant_id,
            created_at: file.created_at,
        }
    }
}
