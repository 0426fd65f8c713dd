//! Gzip compression for generic file uploads
//!
//! Large text-like uploads are gzipped before hitting storage. Media formats
//! (video, images, audio, archives) are already compressed and are stored
//! verbatim.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

const COMPRESSIBLE_APPLICATION_TYPES: &[&str] = &[
    "application/json",
    "application/javascript",
    "application/xml",
    "application/x-yaml",
    "application/x-ndjson",
    "image/svg+xml",
];

/// Whether a content type benefits from gzip at all
pub fn is_compressible(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();

    mime.starts_with("text/") || COMPRESSIBLE_APPLICATION_TYPES.contains(&mime.as_str())
}

/// Whether an upload of this type and size should be compressed.
///
/// Only payloads strictly larger than the threshold are compressed; a payload
/// exactly at the threshold is stored as-is.
pub fn should_compress(content_type: &str, size: usize, threshold: usize) -> bool {
    size > threshold && is_compressible(content_type)
}

/// Gzip-compress a payload
pub fn gzip_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .context("Failed to write data to gzip encoder")?;
    encoder.finish().context("Failed to finalize gzip stream")
}

/// Decompress a gzip payload
pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .context("Failed to decompress gzip stream")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_compressible() {
        assert!(is_compressible("text/plain"));
        assert!(is_compressible("text/csv; charset=utf-8"));
        assert!(is_compressible("application/json"));
        assert!(is_compressible("APPLICATION/JSON"));
        assert!(is_compressible("image/svg+xml"));
        assert!(!is_compressible("video/mp4"));
        assert!(!is_compressible("image/jpeg"));
        assert!(!is_compressible("application/zip"));
        assert!(!is_compressible("application/octet-stream"));
    }

    #[test]
    fn test_should_compress_threshold_is_strict() {
        let threshold = 1024;
        assert!(!should_compress("text/plain", threshold - 1, threshold));
        assert!(!should_compress("text/plain", threshold, threshold));
        assert!(should_compress("text/plain", threshold + 1, threshold));
    }

    #[test]
    fn test_should_compress_skips_media_types() {
        assert!(!should_compress("video/mp4", 100 * 1024 * 1024, 1024));
        assert!(!should_compress("image/png", 100 * 1024 * 1024, 1024));
    }

    #[test]
    fn test_gzip_round_trip() {
        let data = "hello world ".repeat(1000).into_bytes();
        let compressed = gzip_compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(gzip_decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_gzip_decompress_rejects_garbage() {
        assert!(gzip_decompress(b"not gzip data").is_err());
    }
}
