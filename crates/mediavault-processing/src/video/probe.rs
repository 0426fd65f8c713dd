//! Video metadata extraction via ffprobe

use super::validate_path;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tokio::process::Command;

/// Metadata extracted from a video container.
///
/// Every field is optional: a damaged or exotic container may yield only a
/// subset, and partial metadata is still worth persisting.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub format: Option<String>,
    pub duration: Option<f64>,
    pub resolution: Option<String>,
}

/// ffprobe wrapper
#[derive(Clone)]
pub struct VideoProbe {
    ffprobe_path: String,
}

impl VideoProbe {
    pub fn new(ffprobe_path: String) -> Result<Self> {
        validate_path(&ffprobe_path).context("Invalid ffprobe_path")?;
        Ok(Self { ffprobe_path })
    }

    /// Probe a video held in memory
    pub async fn probe(&self, data: &[u8]) -> Result<VideoMetadata> {
        let temp_file = tempfile::NamedTempFile::new()?;
        tokio::fs::write(temp_file.path(), data).await?;
        self.probe_path(temp_file.path()).await
    }

    /// Probe a video file on disk
    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe_path(&self, video_path: &Path) -> Result<VideoMetadata> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(video_path)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let probe_data: serde_json::Value =
            serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;

        let format_section = &probe_data["format"];

        let format = format_section["format_name"]
            .as_str()
            .map(|f| f.to_string());

        let duration = format_section["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok());

        let resolution = probe_data["streams"].get(0).and_then(|stream| {
            let width = stream["width"].as_u64()?;
            let height = stream["height"].as_u64()?;
            Some(format!("{}x{}", width, height))
        });

        let metadata = VideoMetadata {
            format,
            duration,
            resolution,
        };

        tracing::debug!(
            ?metadata,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ffprobe completed"
        );

        Ok(metadata)
    }
}
