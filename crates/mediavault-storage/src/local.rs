use crate::keys;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use futures::StreamExt;
use mediavault_core::StorageBackend;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};
use uuid::Uuid;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/mediavault/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys with path traversal sequences that could escape the base
    /// storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // Existing files must resolve inside the base directory even through
        // symlinks. Files that don't exist yet were already screened above.
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.ensure_parent_dir(path).await?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        tenant_id: Uuid,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = keys::generate_media_key(tenant_id, filename);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        let start = std::time::Instant::now();
        self.write_file(&path, &data).await?;
        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok((key, url))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        let start = std::time::Instant::now();
        self.write_file(&path, &data).await?;
        let url = self.generate_url(storage_key);

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload_with_key successful"
        );

        Ok(url)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        self.download_range(storage_key, 0, None).await
    }

    async fn download_range(
        &self,
        storage_key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<ByteStream> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let mut file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await.map_err(|e| {
                StorageError::DownloadFailed(format!(
                    "Failed to seek to offset {} in {}: {}",
                    offset,
                    path.display(),
                    e
                ))
            })?;
        }

        let stream: ByteStream = match length {
            Some(len) => {
                let reader = tokio_util::io::ReaderStream::new(file.take(len));
                Box::pin(reader.map(|result| {
                    result.map_err(|e| {
                        StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
                    })
                }))
            }
            None => {
                let reader = tokio_util::io::ReaderStream::new(file);
                Box::pin(reader.map(|result| {
                    result.map_err(|e| {
                        StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
                    })
                }))
            }
        };

        Ok(stream)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let meta = fs::metadata(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(storage_key.to_string()),
            _ => StorageError::BackendError(e.to_string()),
        })?;
        Ok(meta.len())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_local_storage_upload_download() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        let tenant_id = Uuid::new_v4();
        let data = b"test data".to_vec();

        let (key, url) = storage
            .upload(tenant_id, "test.txt", "text/plain", data.clone())
            .await
            .unwrap();

        assert!(key.contains("test.txt"));
        assert!(url.contains("test.txt"));

        let downloaded = storage.download(&key).await.unwrap();
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        assert!(storage.delete("nonexistent/file.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_download_missing_key_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        let result = storage.download("media/missing.bin").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        let result = storage.content_length("media/missing.bin").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_with_key_and_content_length() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        let key = "media/tenant/thumbnails/thumb.jpg";
        storage
            .upload_with_key(key, vec![0u8; 1024], "image/jpeg")
            .await
            .unwrap();

        assert!(storage.exists(key).await.unwrap());
        assert_eq!(storage.content_length(key).await.unwrap(), 1024);
    }

    #[tokio::test]
    async fn test_download_range_middle() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        let data: Vec<u8> = (0..=255).collect();
        let (key, _) = storage
            .upload(Uuid::new_v4(), "bytes.bin", "application/octet-stream", data.clone())
            .await
            .unwrap();

        let stream = storage.download_range(&key, 10, Some(20)).await.unwrap();
        assert_eq!(collect(stream).await, data[10..30].to_vec());
    }

    #[tokio::test]
    async fn test_download_range_open_ended() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        let data: Vec<u8> = (0..100).collect();
        let (key, _) = storage
            .upload(Uuid::new_v4(), "tail.bin", "application/octet-stream", data.clone())
            .await
            .unwrap();

        let stream = storage.download_range(&key, 90, None).await.unwrap();
        assert_eq!(collect(stream).await, data[90..].to_vec());
    }

    #[tokio::test]
    async fn test_download_stream_full() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();

        let data = b"stream download test".to_vec();
        let (key, _) = storage
            .upload(Uuid::new_v4(), "stream_dl.txt", "text/plain", data.clone())
            .await
            .unwrap();

        let stream = storage.download_stream(&key).await.unwrap();
        assert_eq!(collect(stream).await, data);
    }
}
