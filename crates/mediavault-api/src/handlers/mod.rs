pub mod file_stream;
pub mod file_upload;
pub mod health;
pub mod thumbnail;
pub mod video;
pub mod video_upload;
