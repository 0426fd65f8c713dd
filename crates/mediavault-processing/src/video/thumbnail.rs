//! Thumbnail frame extraction via ffmpeg

use super::validate_path;
use anyhow::{anyhow, Context, Result};
use std::process::Stdio;
use tokio::process::Command;

/// Default capture point for a video of the given duration.
///
/// Very short or unprobed videos use a fixed 5 second mark (clamped later if
/// needed); otherwise a quarter of the way in, at least 1 second, skipping
/// black intro frames.
pub fn default_timestamp(duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d >= 2.0 => (d * 0.25).floor().max(1.0),
        _ => 5.0,
    }
}

/// Clamp a caller-supplied capture point into the playable range
pub fn clamp_timestamp(at: f64, duration: Option<f64>) -> f64 {
    let at = at.max(0.0);
    match duration {
        Some(d) => at.min((d - 1.0).max(0.0)),
        None => at,
    }
}

/// ffmpeg wrapper that captures a single frame as JPEG
pub struct ThumbnailExtractor {
    ffmpeg_path: String,
    max_width: u32,
}

impl ThumbnailExtractor {
    pub fn new(ffmpeg_path: String, max_width: u32) -> Result<Self> {
        validate_path(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        Ok(Self {
            ffmpeg_path,
            max_width,
        })
    }

    /// Capture one frame at `timestamp` seconds, scaled down to fit
    /// `max_width` while preserving aspect ratio.
    #[tracing::instrument(skip(self, data), fields(
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "thumbnail",
        timestamp = timestamp
    ))]
    pub async fn extract_frame(&self, data: &[u8], timestamp: f64) -> Result<Vec<u8>> {
        let start = std::time::Instant::now();

        let input_temp = tempfile::NamedTempFile::new()?;
        tokio::fs::write(input_temp.path(), data).await?;

        // ffmpeg picks the JPEG encoder from the output extension
        let output_temp = tempfile::Builder::new().suffix(".jpg").tempfile()?;

        let scale_filter = format!(
            "scale={}:-1:force_original_aspect_ratio=decrease",
            self.max_width
        );

        let output = Command::new(&self.ffmpeg_path)
            .args(["-ss", &timestamp.to_string()])
            .arg("-i")
            .arg(input_temp.path())
            .args(["-vframes", "1", "-vf", &scale_filter, "-q:v", "4", "-y"])
            .arg(output_temp.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("ffmpeg thumbnail extraction failed: {}", stderr));
        }

        let frame = tokio::fs::read(output_temp.path()).await?;
        if frame.is_empty() {
            return Err(anyhow!(
                "ffmpeg produced no frame at timestamp {}",
                timestamp
            ));
        }

        tracing::info!(
            size_bytes = frame.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail frame extracted"
        );

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timestamp_short_or_unknown() {
        assert_eq!(default_timestamp(None), 5.0);
        assert_eq!(default_timestamp(Some(0.5)), 5.0);
        assert_eq!(default_timestamp(Some(1.9)), 5.0);
    }

    #[test]
    fn test_default_timestamp_quarter_point() {
        assert_eq!(default_timestamp(Some(2.0)), 1.0);
        assert_eq!(default_timestamp(Some(100.0)), 25.0);
        assert_eq!(default_timestamp(Some(10.0)), 2.0);
        // floor(3.0 * 0.25) = 0, bumped to the 1 second minimum
        assert_eq!(default_timestamp(Some(3.0)), 1.0);
    }

    #[test]
    fn test_clamp_timestamp_within_duration() {
        assert_eq!(clamp_timestamp(5.0, Some(60.0)), 5.0);
        assert_eq!(clamp_timestamp(120.0, Some(60.0)), 59.0);
        assert_eq!(clamp_timestamp(-3.0, Some(60.0)), 0.0);
    }

    #[test]
    fn test_clamp_timestamp_degenerate_durations() {
        // A sub-second video clamps to the first frame
        assert_eq!(clamp_timestamp(10.0, Some(0.5)), 0.0);
        // Unknown duration only clamps the lower bound
        assert_eq!(clamp_timestamp(42.0, None), 42.0);
        assert_eq!(clamp_timestamp(-1.0, None), 0.0);
    }
}
