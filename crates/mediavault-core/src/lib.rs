//! Mediavault Core Library
//!
//! Shared domain models, error types, and configuration used by every
//! mediavault component: the HTTP API, the background workers, and the
//! storage/processing layers.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod task_error;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
pub use task_error::TaskError;
