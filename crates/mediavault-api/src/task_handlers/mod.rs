mod metadata_handler;
mod thumbnail_handler;

pub use metadata_handler::MetadataTaskHandler;
pub use thumbnail_handler::ThumbnailTaskHandler;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::state::AppState;
use mediavault_core::models::Task;

/// Trait for task handlers.
///
/// Handlers must be idempotent: delivery is at-least-once and a retried task
/// re-runs the whole handler. Return `TaskError::Unrecoverable` for failures
/// a retry cannot fix (malformed payloads, invalid input); everything else is
/// retried with backoff.
#[async_trait]
pub trait TaskHandler {
    async fn process(&self, task: &Task, state: Arc<AppState>) -> Result<serde_json::Value>;
}
