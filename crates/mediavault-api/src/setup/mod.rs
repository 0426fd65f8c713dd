//! Application assembly: database, storage, processing tools, task queue,
//! state, and routes.

pub mod database;
pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use axum::Router;
use std::sync::{Arc, Weak};

use mediavault_core::Config;
use mediavault_db::{FileRepository, TaskRepository, VideoRepository};
use mediavault_processing::{ThumbnailExtractor, VideoProbe, VideoTranscoder};
use mediavault_storage::create_storage;
use mediavault_worker::{TaskHandlerContext, TaskQueue, TaskQueueConfig};

use crate::state::{AppState, MediaState, TaskState};

/// Build everything the server needs. Returns the shared state (kept alive by
/// the caller for the worker's weak reference) and the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    config.validate()?;

    let pool = database::initialize_database(&config).await?;

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %storage.backend_type(), "Storage backend initialized");

    let probe = Arc::new(VideoProbe::new(config.ffprobe_path.clone())?);
    let transcoder = Arc::new(VideoTranscoder::new(config.ffmpeg_path.clone())?);
    let thumbnailer = Arc::new(ThumbnailExtractor::new(
        config.ffmpeg_path.clone(),
        config.thumbnail_max_width,
    )?);

    let file_repository = FileRepository::new(pool.clone());
    let video_repository = VideoRepository::new(pool.clone());
    let task_repository = TaskRepository::new(pool.clone());

    let queue_config = TaskQueueConfig {
        max_workers: config.task_queue_max_workers,
        poll_interval_ms: config.task_queue_poll_interval_ms,
        default_timeout_seconds: config.task_queue_default_timeout_seconds,
        max_retries: config.task_queue_max_retries,
        stale_task_reap_interval_secs: config.task_queue_stale_reap_interval_secs,
        stale_task_grace_period_secs: config.task_queue_stale_grace_period_secs,
    };

    // The worker dispatches through a weak reference to the state, so the
    // queue and the state that holds it are built in one cyclic allocation.
    let state = Arc::new_cyclic(|weak: &Weak<AppState>| {
        let context: Weak<dyn TaskHandlerContext> = weak.clone();
        let task_queue = TaskQueue::new(
            task_repository.clone(),
            queue_config,
            context,
            Some(pool.clone()),
        );
        AppState {
            media: MediaState {
                file_repository,
                video_repository,
                storage,
                probe,
                transcoder,
                thumbnailer,
                file_compression_threshold_bytes: config.file_compression_threshold_bytes as u64,
                video_compression_threshold_bytes: config.video_compression_threshold_bytes as u64,
            },
            tasks: TaskState {
                task_queue,
                task_repository,
            },
            config: config.clone(),
            pool,
        }
    });

    let router = routes::build_router(state.clone(), &config)?;

    tracing::info!(
        max_workers = config.task_queue_max_workers,
        "Application initialized"
    );

    Ok((state, router))
}
