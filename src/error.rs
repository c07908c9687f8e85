//! Error types surfaced at the run and task level.

use std::time::Duration;
use thiserror::Error;

/// Failure of a whole run. Only cancellation ends a run early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("run aborted{}", describe_reason(.reason))]
    Aborted { reason: Option<String> },
}

fn describe_reason(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|reason| format!(": {reason}"))
        .unwrap_or_default()
}

impl RunError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RunError::Aborted { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            RunError::Aborted { reason } => reason.as_deref(),
        }
    }
}

/// Why a single task was settled as rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection<E> {
    /// The task did not settle within the configured timeout. The task itself
    /// was left running in the background.
    #[error("task timed out after {0:?}")]
    Timeout(Duration),

    /// The task's own error, passed through untouched.
    #[error("{0}")]
    Failed(E),

    /// A task raced against a timeout was dropped by the runtime, e.g. during
    /// shutdown, before either it or the timer finished.
    #[error("task was dropped by the runtime before it settled")]
    Lost,
}

impl<E> Rejection<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Rejection::Timeout(_))
    }

    pub fn failure(&self) -> Option<&E> {
        match self {
            Rejection::Failed(error) => Some(error),
            Rejection::Timeout(_) | Rejection::Lost => None,
        }
    }

    pub fn into_failure(self) -> Option<E> {
        match self {
            Rejection::Failed(error) => Some(error),
            Rejection::Timeout(_) | Rejection::Lost => None,
        }
    }
}
