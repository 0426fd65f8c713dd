//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`.

use mediavault_core::Config;
use mediavault_db::{FileRepository, TaskRepository, VideoRepository};
use mediavault_processing::{ThumbnailExtractor, VideoProbe, VideoTranscoder};
use mediavault_storage::Storage;
use mediavault_worker::TaskQueue;
use sqlx::PgPool;
use std::sync::Arc;

/// Repositories, storage, and media processing tools used by the upload,
/// streaming, and background-job paths.
#[derive(Clone)]
pub struct MediaState {
    pub file_repository: FileRepository,
    pub video_repository: VideoRepository,
    pub storage: Arc<dyn Storage>,
    pub probe: Arc<VideoProbe>,
    pub transcoder: Arc<VideoTranscoder>,
    pub thumbnailer: Arc<ThumbnailExtractor>,
    /// Non-video uploads above this size are gzip-compressed before storage
    pub file_compression_threshold_bytes: u64,
    /// Videos above this size get a transcoding pass before storage
    pub video_compression_threshold_bytes: u64,
}

/// Task queue and repository
#[derive(Clone)]
pub struct TaskState {
    pub task_queue: TaskQueue,
    pub task_repository: TaskRepository,
}

/// Main application state: aggregates sub-states for dependency injection.
pub struct AppState {
    pub media: MediaState,
    pub tasks: TaskState,
    pub config: Config,
    pub pool: PgPool,
}

impl axum::extract::FromRef<Arc<AppState>> for MediaState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for TaskState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.tasks.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
