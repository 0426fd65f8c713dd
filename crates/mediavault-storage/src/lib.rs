//! Mediavault Storage Library
//!
//! Storage abstraction and implementations: the Storage trait plus S3 and
//! local filesystem backends.
//!
//! # Storage key format
//!
//! Storage keys are tenant-scoped:
//!
//! - **Uploads**: `media/{tenant_id}/{timestamp}-{sanitized_filename}`
//! - **Thumbnails**: `media/{tenant_id}/thumbnails/{video_id}.jpg`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use mediavault_core::StorageBackend;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
