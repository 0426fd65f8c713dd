//! Video transcoding via ffmpeg
//!
//! Two transforms run at upload time: a faststart remux that moves the moov
//! atom to the front so playback can begin before the full file arrives, and
//! a size-triggered re-encode that caps resolution at 720p.

use super::validate_path;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

pub struct VideoTranscoder {
    ffmpeg_path: String,
}

impl VideoTranscoder {
    pub fn new(ffmpeg_path: String) -> Result<Self> {
        validate_path(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        Ok(Self { ffmpeg_path })
    }

    /// Remux for progressive playback without re-encoding. Stream copy, so
    /// this is fast even for large inputs.
    pub async fn faststart(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.run_transform(
            data,
            &["-c", "copy", "-movflags", "+faststart"],
            "faststart",
        )
        .await
    }

    /// Re-encode oversized videos: H.264/AAC, resolution capped at 720p,
    /// faststart applied in the same pass.
    pub async fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.run_transform(
            data,
            &[
                "-c:v",
                "libx264",
                "-preset",
                "fast",
                "-vf",
                "scale=-2:min(720\\,ih)",
                "-c:a",
                "aac",
                "-movflags",
                "+faststart",
            ],
            "compress",
        )
        .await
    }

    async fn run_transform(&self, data: &[u8], args: &[&str], operation: &str) -> Result<Vec<u8>> {
        let input_temp = tempfile::NamedTempFile::new()?;
        tokio::fs::write(input_temp.path(), data).await?;

        let output_temp = tempfile::NamedTempFile::new()?;

        self.run_ffmpeg(input_temp.path(), output_temp.path(), args, operation)
            .await?;

        let output_data = tokio::fs::read(output_temp.path()).await?;
        if output_data.is_empty() {
            return Err(anyhow!("ffmpeg {} produced empty output", operation));
        }

        Ok(output_data)
    }

    #[tracing::instrument(skip(self, args), fields(
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = %operation
    ))]
    async fn run_ffmpeg(
        &self,
        input_path: &Path,
        output_path: &Path,
        args: &[&str],
        operation: &str,
    ) -> Result<()> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(input_path)
            .args(args)
            .args(["-f", "mp4", "-y"])
            .arg(output_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("ffmpeg {} failed: {}", operation, stderr));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ffmpeg transform completed"
        );

        Ok(())
    }
}
