//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use mediavault_core::StorageBackend;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of bytes produced by the download methods
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait so
/// that handlers and workers never couple to a specific backend.
///
/// **Key format:** see the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a file and return (storage_key, storage_url)
    ///
    /// The storage_key is an internal identifier used to reference the file.
    /// The storage_url is the publicly accessible URL to the file.
    async fn upload(
        &self,
        tenant_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)>;

    /// Upload data to a specific storage key (thumbnails, derived artifacts).
    /// Returns the public URL for the uploaded file.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Download a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Download a file as a stream of `Bytes` chunks (for large files)
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Download part of a file, starting at `offset`.
    ///
    /// With `length = None` the stream runs to the end of the object. The
    /// caller is responsible for validating the range against the object's
    /// size first; an offset past the end is a backend error.
    async fn download_range(
        &self,
        storage_key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<ByteStream>;

    /// Delete a file by its storage key. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
