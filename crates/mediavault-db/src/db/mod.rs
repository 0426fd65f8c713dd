pub mod file;
pub mod task;
pub mod video;

pub use file::FileRepository;
pub use task::{TaskRepository, NEW_TASK_CHANNEL};
pub use video::VideoRepository;
