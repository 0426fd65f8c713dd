//! ffmpeg/ffprobe wrappers for video processing

pub mod probe;
pub mod thumbnail;
pub mod transcode;

use anyhow::{anyhow, Result};

/// Validate that a path doesn't contain shell metacharacters or dangerous sequences
pub(crate) fn validate_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Path contains dangerous characters: {}", path));
    }

    if path.contains("..") {
        return Err(anyhow!("Path contains directory traversal: {}", path));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_rejects_metacharacters() {
        assert!(validate_path("/usr/bin/ffmpeg").is_ok());
        assert!(validate_path("ffmpeg").is_ok());
        assert!(validate_path("/usr/bin/ffmpeg; rm -rf /").is_err());
        assert!(validate_path("$(whoami)").is_err());
        assert!(validate_path("../../bin/sh").is_err());
    }
}
