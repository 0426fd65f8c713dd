//! Mediavault Worker Library
//!
//! Postgres-backed task queue: a bounded worker pool wakes on LISTEN/NOTIFY
//! (with polling as fallback), claims tasks with SKIP LOCKED, and dispatches
//! them through a [`TaskHandlerContext`] implemented by the API's state.

pub mod context;
pub mod queue;

pub use context::TaskHandlerContext;
pub use queue::{TaskQueue, TaskQueueConfig};
