//! Database repositories for the data access layer
//!
//! Each repository owns a single table and exposes tenant-scoped CRUD plus
//! the specialized queries its domain needs. Handlers never run SQL directly.

pub mod db;

pub use db::{FileRepository, TaskRepository, VideoRepository, NEW_TASK_CHANNEL};
