pub mod file;
pub mod task;
pub mod video;

pub use file::{FileResponse, StoredFile};
pub use task::{
    Task, TaskPayload, TaskStatus, TaskType, VideoMetadataPayload, VideoThumbnailPayload,
};
pub use video::{ThumbnailResponse, VideoAsset, VideoResponse};
