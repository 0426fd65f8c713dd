//! Task handler context trait
//!
//! The API implements this trait for its application state. The worker calls
//! `dispatch_task` when processing a task; the implementation matches on task
//! type and invokes the appropriate handler.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use mediavault_core::models::Task;

/// Context for task dispatch.
///
/// Implemented by the API's application state. The worker holds a weak
/// reference and calls `dispatch_task` when processing a claimed task.
#[async_trait]
pub trait TaskHandlerContext: Send + Sync {
    /// Dispatch a task to the appropriate handler and return the result.
    async fn dispatch_task(self: Arc<Self>, task: &Task) -> Result<serde_json::Value>;
}
