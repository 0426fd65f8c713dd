//! Configuration module
//!
//! Environment-driven configuration for the API server, storage backends,
//! media processing tools, and the background task queue.

use std::env;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Application configuration, loaded once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Auth
    pub jwt_secret: String,
    // Storage backend: "s3" or "local"
    pub storage_backend: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Media processing
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_upload_size_bytes: usize,
    /// Non-video uploads larger than this are gzip-compressed before storage.
    pub file_compression_threshold_bytes: usize,
    /// Video uploads larger than this are re-encoded at a capped resolution.
    pub video_compression_threshold_bytes: usize,
    pub thumbnail_max_width: u32,
    // Task queue
    pub task_queue_max_workers: usize,
    pub task_queue_poll_interval_ms: u64,
    pub task_queue_default_timeout_seconds: i32,
    pub task_queue_max_retries: i32,
    /// Seconds between sweeps that requeue tasks abandoned by dead workers.
    pub task_queue_stale_reap_interval_secs: u64,
    /// Grace added to a task's timeout before it counts as abandoned.
    pub task_queue_stale_grace_period_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_UPLOAD_SIZE_MB: usize = 500;
        const FILE_COMPRESSION_THRESHOLD_MB: usize = 10;
        const VIDEO_COMPRESSION_THRESHOLD_MB: usize = 200;
        const THUMBNAIL_MAX_WIDTH: u32 = 854;
        const TASK_QUEUE_MAX_WORKERS: usize = 4;
        const TASK_QUEUE_POLL_INTERVAL_MS: u64 = 1000;
        const TASK_QUEUE_DEFAULT_TIMEOUT_SECS: i32 = 600;
        const TASK_QUEUE_MAX_RETRIES: i32 = 3;
        const TASK_QUEUE_STALE_REAP_INTERVAL_SECS: u64 = 60;
        const TASK_QUEUE_STALE_GRACE_PERIOD_SECS: i64 = 300;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let file_compression_threshold_mb = env::var("FILE_COMPRESSION_THRESHOLD_MB")
            .unwrap_or_else(|_| FILE_COMPRESSION_THRESHOLD_MB.to_string())
            .parse::<usize>()
            .unwrap_or(FILE_COMPRESSION_THRESHOLD_MB);

        let video_compression_threshold_mb = env::var("VIDEO_COMPRESSION_THRESHOLD_MB")
            .unwrap_or_else(|_| VIDEO_COMPRESSION_THRESHOLD_MB.to_string())
            .parse::<usize>()
            .unwrap_or(VIDEO_COMPRESSION_THRESHOLD_MB);

        Ok(Config {
            environment,
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            storage_backend: env::var("STORAGE_BACKEND")
                .unwrap_or_else(|_| "local".to_string())
                .to_lowercase(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "/usr/bin/ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH")
                .unwrap_or_else(|_| "/usr/bin/ffprobe".to_string()),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            file_compression_threshold_bytes: file_compression_threshold_mb * 1024 * 1024,
            video_compression_threshold_bytes: video_compression_threshold_mb * 1024 * 1024,
            thumbnail_max_width: env::var("THUMBNAIL_MAX_WIDTH")
                .unwrap_or_else(|_| THUMBNAIL_MAX_WIDTH.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_MAX_WIDTH),
            task_queue_max_workers: env::var("TASK_QUEUE_MAX_WORKERS")
                .unwrap_or_else(|_| TASK_QUEUE_MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_MAX_WORKERS),
            task_queue_poll_interval_ms: env::var("TASK_QUEUE_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| TASK_QUEUE_POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_POLL_INTERVAL_MS),
            task_queue_default_timeout_seconds: env::var("TASK_QUEUE_DEFAULT_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| TASK_QUEUE_DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_DEFAULT_TIMEOUT_SECS),
            task_queue_max_retries: env::var("TASK_QUEUE_MAX_RETRIES")
                .unwrap_or_else(|_| TASK_QUEUE_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_MAX_RETRIES),
            task_queue_stale_reap_interval_secs: env::var("TASK_QUEUE_STALE_REAP_INTERVAL_SECS")
                .unwrap_or_else(|_| TASK_QUEUE_STALE_REAP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_STALE_REAP_INTERVAL_SECS),
            task_queue_stale_grace_period_secs: env::var("TASK_QUEUE_STALE_GRACE_PERIOD_SECS")
                .unwrap_or_else(|_| TASK_QUEUE_STALE_GRACE_PERIOD_SECS.to_string())
                .parse()
                .unwrap_or(TASK_QUEUE_STALE_GRACE_PERIOD_SECS),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Fail fast on misconfiguration instead of at first use.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend.as_str() {
            "s3" => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set when STORAGE_BACKEND=s3"));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!("S3_REGION must be set when STORAGE_BACKEND=s3"));
                }
            }
            "local" => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 's3' or 'local', got '{}'",
                    other
                ));
            }
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            environment: "development".to_string(),
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            database_url: "postgres://localhost/mediavault".to_string(),
            db_max_connections: 20,
            db_timeout_seconds: 30,
            jwt_secret: "secret".to_string(),
            storage_backend: "local".to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some("/tmp/mediavault".to_string()),
            local_storage_base_url: Some("http://localhost:4000/media".to_string()),
            ffmpeg_path: "/usr/bin/ffmpeg".to_string(),
            ffprobe_path: "/usr/bin/ffprobe".to_string(),
            max_upload_size_bytes: 500 * 1024 * 1024,
            file_compression_threshold_bytes: 10 * 1024 * 1024,
            video_compression_threshold_bytes: 200 * 1024 * 1024,
            thumbnail_max_width: 854,
            task_queue_max_workers: 4,
            task_queue_poll_interval_ms: 1000,
            task_queue_default_timeout_seconds: 600,
            task_queue_max_retries: 3,
            task_queue_stale_reap_interval_secs: 60,
            task_queue_stale_grace_period_secs: 300,
        }
    }

    #[test]
    fn test_validate_local_requires_path() {
        let mut config = sample_config();
        assert!(config.validate().is_ok());
        config.local_storage_path = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_s3_requires_bucket_and_region() {
        let mut config = sample_config();
        config.storage_backend = "s3".to_string();
        assert!(config.validate().is_err());
        config.s3_bucket = Some("media".to_string());
        config.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let mut config = sample_config();
        config.storage_backend = "ftp".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wildcard_cors_in_production() {
        let mut config = sample_config();
        config.environment = "production".to_string();
        assert!(config.validate().is_err());
        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_ok());
    }
}
