use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use mediavault_core::models::{Task, TaskStatus, TaskType};

const TASK_COLUMNS: &str = "id, tenant_id, task_type, status, priority, payload, result, scheduled_at, started_at, completed_at, retry_count, max_retries, timeout_seconds, created_at, updated_at";

/// Notification channel workers LISTEN on to wake immediately after enqueue
pub const NEW_TASK_CHANNEL: &str = "mediavault_new_task";

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new task
    ///
    /// The insert and the wake-up notification run in one transaction so a
    /// task is never announced before it is visible to claimers.
    #[tracing::instrument(skip(self, payload))]
    pub async fn create_task(
        &self,
        tenant_id: Uuid,
        task_type: TaskType,
        payload: serde_json::Value,
        priority: i32,
        scheduled_at: Option<DateTime<Utc>>,
        max_retries: Option<i32>,
        timeout_seconds: Option<i32>,
    ) -> Result<Task> {
        let scheduled_at = scheduled_at.unwrap_or_else(Utc::now);
        let max_retries = max_retries.unwrap_or(3);
        let status = if scheduled_at > Utc::now() {
            TaskStatus::Scheduled
        } else {
            TaskStatus::Pending
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for task creation")?;

        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            INSERT INTO tasks (tenant_id, task_type, status, priority, payload, scheduled_at, max_retries, timeout_seconds)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(tenant_id)
        .bind(task_type.to_string())
        .bind(status)
        .bind(priority)
        .bind(payload)
        .bind(scheduled_at)
        .bind(max_retries)
        .bind(timeout_seconds)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                tenant_id = %tenant_id,
                task_type = %task_type,
                "Failed to insert task into database"
            );
            anyhow::anyhow!("Failed to insert task into database: {}", e)
        })?;

        // Notify workers so they wake immediately instead of waiting for the
        // poll interval. Non-fatal: workers discover tasks via polling too.
        if let Err(e) = sqlx::query(&format!("SELECT pg_notify('{NEW_TASK_CHANNEL}', '')"))
            .execute(&mut *tx)
            .await
        {
            tracing::warn!(
                error = %e,
                task_id = %task.id,
                "Failed to send pg_notify for new task, workers will discover it via polling"
            );
        }

        tx.commit()
            .await
            .context("Failed to commit transaction for task creation")?;

        tracing::info!(
            task_id = %task.id,
            tenant_id = %tenant_id,
            task_type = %task_type,
            priority = priority,
            "Task created"
        );

        Ok(task)
    }

    /// Get a task by ID with tenant check
    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, tenant_id: Uuid, task_id: Uuid) -> Result<Option<Task>> {
        let task: Option<Task> = sqlx::query_as::<Postgres, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE tenant_id = $1 AND id = $2",
        ))
        .bind(tenant_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch task")?;

        Ok(task)
    }

    /// Atomically claim the next available task (system-wide, used by workers)
    ///
    /// Queries across all tenants: workers form a shared pool and handlers
    /// carry the tenant id in their payloads. FOR UPDATE SKIP LOCKED lets
    /// concurrent claimers pick distinct rows without blocking each other.
    #[tracing::instrument(skip(self))]
    pub async fn claim_next_task(&self) -> Result<Option<Task>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let task: Option<Task> = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE status IN ('pending', 'scheduled')
                AND scheduled_at <= NOW()
            ORDER BY priority DESC, scheduled_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        ))
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch next task")?;

        if let Some(task) = task {
            let updated_task: Task = sqlx::query_as::<Postgres, Task>(&format!(
                r#"
                UPDATE tasks
                SET status = 'running',
                    started_at = NOW(),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {TASK_COLUMNS}
                "#,
            ))
            .bind(task.id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to update task status")?;

            tx.commit().await.context("Failed to commit transaction")?;

            tracing::debug!(
                task_id = %updated_task.id,
                tenant_id = %updated_task.tenant_id,
                task_type = %updated_task.task_type,
                "Task claimed"
            );

            Ok(Some(updated_task))
        } else {
            tx.rollback().await.ok();
            Ok(None)
        }
    }

    /// Update task status (system method, no tenant check for workers)
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, task_id: Uuid, status: TaskStatus) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .context("Failed to update task status")?;

        tracing::debug!(task_id = %task_id, status = %status, "Task status updated");

        Ok(task)
    }

    /// Mark task as completed with result (system method)
    #[tracing::instrument(skip(self, result))]
    pub async fn mark_completed(&self, task_id: Uuid, result: serde_json::Value) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'completed',
                result = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(result)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark task as completed")?;

        tracing::info!(
            task_id = %task_id,
            tenant_id = %task.tenant_id,
            task_type = %task.task_type,
            "Task completed"
        );

        Ok(task)
    }

    /// Mark task as failed with error details (system method)
    #[tracing::instrument(skip(self, error))]
    pub async fn mark_failed(&self, task_id: Uuid, error: serde_json::Value) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'failed',
                result = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(error)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark task as failed")?;

        tracing::error!(
            task_id = %task_id,
            tenant_id = %task.tenant_id,
            task_type = %task.task_type,
            retry_count = task.retry_count,
            "Task failed"
        );

        Ok(task)
    }

    /// Requeue running tasks whose claimer is presumed dead.
    ///
    /// A claim commits `status = 'running'` before the handler executes; a
    /// worker that crashes mid-task leaves the row in that state and no claim
    /// query will ever see it again. This sweep moves rows that have outlived
    /// their timeout plus a grace period back to 'scheduled'. Handlers are
    /// idempotent, so a task whose worker died after the work but before the
    /// completion update re-runs harmlessly. Returns the number requeued.
    #[tracing::instrument(skip(self))]
    pub async fn reap_stale_running_tasks(
        &self,
        default_timeout_seconds: i32,
        grace_period_seconds: i64,
    ) -> Result<u64> {
        let running: Vec<Task> = sqlx::query_as::<Postgres, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status = 'running'",
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch running tasks for staleness sweep")?;

        let now = Utc::now();
        let stale_ids: Vec<Uuid> = running
            .iter()
            .filter(|t| t.is_stale(default_timeout_seconds, grace_period_seconds, now))
            .map(|t| t.id)
            .collect();

        if stale_ids.is_empty() {
            return Ok(0);
        }

        // The status guard skips rows a handler finished between the scan
        // and this update.
        let reaped = sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'scheduled',
                started_at = NULL,
                scheduled_at = NOW(),
                updated_at = NOW()
            WHERE id = ANY($1)
                AND status = 'running'
            "#,
        )
        .bind(&stale_ids)
        .execute(&self.pool)
        .await
        .context("Failed to requeue stale running tasks")?
        .rows_affected();

        if reaped > 0 {
            tracing::warn!(
                reaped = reaped,
                "Requeued running tasks abandoned by dead workers"
            );
        }

        Ok(reaped)
    }

    /// Increment retry count and push the task back into the queue with a
    /// delay. Status goes to 'scheduled' so claimers honor the backoff.
    #[tracing::instrument(skip(self))]
    pub async fn increment_retry(&self, task_id: Uuid, backoff_seconds: u64) -> Result<Task> {
        let task: Task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = 'scheduled',
                retry_count = retry_count + 1,
                started_at = NULL,
                scheduled_at = NOW() + make_interval(secs => $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task_id)
        .bind(backoff_seconds as f64)
        .fetch_one(&self.pool)
        .await
        .context("Failed to increment task retry count")?;

        tracing::warn!(
            task_id = %task_id,
            retry_count = task.retry_count,
            max_retries = task.max_retries,
            backoff_seconds = backoff_seconds,
            "Task scheduled for retry"
        );

        Ok(task)
    }
}
