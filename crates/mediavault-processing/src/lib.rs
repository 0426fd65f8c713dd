//! Mediavault Processing Library
//!
//! Media transformation primitives: gzip compression for generic uploads and
//! ffmpeg/ffprobe wrappers for video optimization, probing, and thumbnails.
//! Everything here is pure byte-in/byte-out; storage and persistence live in
//! other crates.

pub mod compression;
pub mod video;

pub use compression::{gzip_compress, gzip_decompress, is_compressible, should_compress};
pub use video::probe::{VideoMetadata, VideoProbe};
pub use video::thumbnail::{clamp_timestamp, default_timestamp, ThumbnailExtractor};
pub use video::transcode::VideoTranscoder;
