//! Recoverability signal for background task failures.
//!
//! The worker downcasts a failed handler's `anyhow::Error` to [`TaskError`]
//! to decide between retrying with backoff and failing the task outright.
//! Errors that never pass through this type count as recoverable.

use thiserror::Error;

/// A task handler failure, tagged with whether a retry can help.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Transient failure (network, storage, tool timeout). The queue retries
    /// with backoff until the task's retry budget runs out.
    #[error("{0}")]
    Recoverable(anyhow::Error),
    /// Permanent failure (malformed payload, invalid input). Retrying would
    /// hit the same error, so the task fails immediately.
    #[error("{0}")]
    Unrecoverable(anyhow::Error),
}

impl TaskError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TaskError::Recoverable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecoverable_variant() {
        let err = TaskError::Unrecoverable(anyhow::anyhow!("malformed payload"));
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("malformed payload"));
    }

    #[test]
    fn test_recoverable_variant() {
        let err = TaskError::Recoverable(anyhow::anyhow!("network timeout"));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("network timeout"));
    }

    #[test]
    fn test_tag_survives_anyhow_round_trip() {
        let err: anyhow::Error = TaskError::Unrecoverable(anyhow::anyhow!("bad input")).into();
        let tagged = err.downcast_ref::<TaskError>().unwrap();
        assert!(!tagged.is_recoverable());
    }
}
