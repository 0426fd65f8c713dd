//! TaskHandlerContext implementation for AppState.
//!
//! Dispatches tasks to the appropriate handler based on task type.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use mediavault_core::models::{Task, TaskType};
use mediavault_worker::TaskHandlerContext;

use crate::state::AppState;
use crate::task_handlers::{MetadataTaskHandler, TaskHandler, ThumbnailTaskHandler};

#[async_trait]
impl TaskHandlerContext for AppState {
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<serde_json::Value> {
        match task.task_type {
            TaskType::ExtractVideoMetadata => {
                let handler = MetadataTaskHandler;
                handler.process(task, self).await
            }
            TaskType::GenerateVideoThumbnail => {
                let handler = ThumbnailTaskHandler;
                handler.process(task, self).await
            }
        }
    }
}
