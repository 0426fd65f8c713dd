use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ExtractVideoMetadata,
    GenerateVideoThumbnail,
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskType::ExtractVideoMetadata => write!(f, "extract_video_metadata"),
            TaskType::GenerateVideoThumbnail => write!(f, "generate_video_thumbnail"),
        }
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract_video_metadata" => Ok(TaskType::ExtractVideoMetadata),
            "generate_video_thumbnail" => Ok(TaskType::GenerateVideoThumbnail),
            _ => Err(anyhow::anyhow!("Invalid task type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Scheduled,
    Cancelled,
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Scheduled => write!(f, "scheduled"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "scheduled" => Ok(TaskStatus::Scheduled),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

/// One unit of asynchronous work, persisted in the `tasks` table.
///
/// Delivery is at-least-once: handlers must be idempotent per (task_type,
/// target id). Retryable failures bump `retry_count` until `max_retries`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: i32,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub timeout_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Task {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Task {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            task_type: row.get::<String, _>("task_type").parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse task_type: {}", e).into())
            })?,
            status: row.get("status"),
            priority: row.get("priority"),
            payload: row.get("payload"),
            result: row.get("result"),
            scheduled_at: row.get("scheduled_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            retry_count: row.get("retry_count"),
            max_retries: row.get("max_retries"),
            timeout_seconds: row.get("timeout_seconds"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

impl Task {
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// True when a claimed task has outlived its timeout plus a grace period.
    ///
    /// A running row whose claimer died stays `running` forever unless some
    /// process requeues it; this predicate decides which rows qualify. The
    /// grace period leaves room for a slow handler whose in-process timeout
    /// has fired but whose status update has not landed yet.
    pub fn is_stale(
        &self,
        default_timeout_seconds: i32,
        grace_period_seconds: i64,
        now: DateTime<Utc>,
    ) -> bool {
        if self.status != TaskStatus::Running {
            return false;
        }
        let Some(started_at) = self.started_at else {
            return false;
        };
        let timeout = i64::from(self.timeout_seconds.unwrap_or(default_timeout_seconds));
        started_at + chrono::Duration::seconds(timeout + grace_period_seconds) < now
    }

    /// Extract the payload as a typed struct, returning an error on failure.
    ///
    /// Payloads are validated at dequeue time so malformed data fails fast
    /// instead of surfacing as missing-field errors deep inside a handler.
    pub fn try_payload_as<P: TaskPayload>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// Create a payload value from a typed struct.
    /// Use this when creating tasks to ensure type consistency.
    pub fn payload_from<P: TaskPayload>(payload: &P) -> serde_json::Value {
        serde_json::to_value(payload).unwrap_or_default()
    }
}

/// Trait for type-safe task payloads
pub trait TaskPayload: Serialize + for<'de> Deserialize<'de> {
    fn task_type() -> TaskType;
}

/// Payload for the metadata extraction queue. Carries a storage key so the
/// worker can re-fetch the media bytes independently of the upload request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadataPayload {
    pub video_id: Uuid,
    pub storage_key: String,
}

impl TaskPayload for VideoMetadataPayload {
    fn task_type() -> TaskType {
        TaskType::ExtractVideoMetadata
    }
}

/// Payload for the thumbnail generation queue. `tenant_id` scopes the
/// generated thumbnail's storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoThumbnailPayload {
    pub video_id: Uuid,
    pub tenant_id: Uuid,
    pub storage_key: String,
}

impl TaskPayload for VideoThumbnailPayload {
    fn task_type() -> TaskType {
        TaskType::GenerateVideoThumbnail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_task(payload: serde_json::Value) -> Task {
        Task {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            task_type: TaskType::ExtractVideoMetadata,
            status: TaskStatus::Pending,
            priority: 5,
            payload,
            result: None,
            scheduled_at: Utc::now(),
            started_at: None,
            completed_at: None,
            retry_count: 0,
            max_retries: 3,
            timeout_seconds: Some(600),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_task_type_display() {
        assert_eq!(
            TaskType::ExtractVideoMetadata.to_string(),
            "extract_video_metadata"
        );
        assert_eq!(
            TaskType::GenerateVideoThumbnail.to_string(),
            "generate_video_thumbnail"
        );
    }

    #[test]
    fn test_task_type_from_str() {
        assert_eq!(
            "extract_video_metadata".parse::<TaskType>().unwrap(),
            TaskType::ExtractVideoMetadata
        );
        assert_eq!(
            "generate_video_thumbnail".parse::<TaskType>().unwrap(),
            TaskType::GenerateVideoThumbnail
        );
        assert!("invalid_type".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_task_status_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Scheduled,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("invalid_status".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_can_retry() {
        let mut task = sample_task(json!({}));
        assert!(task.can_retry());
        task.retry_count = 3;
        assert!(!task.can_retry());
    }

    #[test]
    fn test_stale_detection_respects_timeout_and_grace() {
        let now = Utc::now();
        let mut task = sample_task(json!({}));
        task.status = TaskStatus::Running;

        // Claimed 11 minutes ago with a 600s timeout: stale once the grace
        // period is exhausted, not before.
        task.started_at = Some(now - chrono::Duration::seconds(660));
        assert!(task.is_stale(600, 30, now));
        assert!(!task.is_stale(600, 120, now));

        // Per-task timeout wins over the default.
        task.timeout_seconds = Some(30);
        assert!(task.is_stale(600, 60, now));

        // A fresh claim is never stale.
        task.timeout_seconds = Some(600);
        task.started_at = Some(now);
        assert!(!task.is_stale(600, 60, now));
    }

    #[test]
    fn test_stale_detection_only_applies_to_running_tasks() {
        let now = Utc::now();
        let mut task = sample_task(json!({}));
        task.started_at = Some(now - chrono::Duration::seconds(100_000));
        for status in [
            TaskStatus::Pending,
            TaskStatus::Scheduled,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            task.status = status;
            assert!(!task.is_stale(600, 0, now));
        }
        task.status = TaskStatus::Running;
        task.started_at = None;
        assert!(!task.is_stale(600, 0, now));
    }

    #[test]
    fn test_typed_payload_round_trip() {
        let video_id = Uuid::new_v4();
        let payload = VideoMetadataPayload {
            video_id,
            storage_key: "media/t/1-a.mp4".to_string(),
        };
        let task = sample_task(Task::payload_from(&payload));
        let decoded: VideoMetadataPayload = task.try_payload_as().unwrap();
        assert_eq!(decoded.video_id, video_id);
        assert_eq!(decoded.storage_key, "media/t/1-a.mp4");
    }

    #[test]
    fn test_malformed_payload_fails_fast() {
        let task = sample_task(json!({"video_id": 42}));
        let decoded: Result<VideoMetadataPayload, _> = task.try_payload_as();
        assert!(decoded.is_err());
    }
}
