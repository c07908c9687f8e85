use crate::{cancel::CancellationToken, error::RunError, task::TaskResult};

use std::{fmt, sync::Arc, time::Duration};

/// Point-in-time view of a run handed to the progress callback.
///
/// `results.len() == done` always holds. Between batch boundaries the
/// trailing entries that belong to the batch in flight are in completion
/// order. Everything before them, and the whole slice at a batch boundary or
/// in a sequential run, is in input order.
#[derive(Debug)]
pub struct Progress<'a, T, E> {
    pub done: usize,
    pub total: usize,
    pub results: &'a [TaskResult<T, E>],
}

impl<T: Clone, E: Clone> Progress<'_, T, E> {
    pub fn to_owned_results(&self) -> Vec<TaskResult<T, E>> {
        self.results.to_vec()
    }
}

pub type ProgressCallback<T, E> = Arc<dyn Fn(Progress<'_, T, E>) + Send + Sync>;

/// Per-run settings. Every field is optional; unset means no callback, no
/// cancellation, no timeout and no rate limit.
pub struct RunOptions<T, E> {
    pub(crate) on_progress: Option<ProgressCallback<T, E>>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) rate_per_second: Option<u32>,
}

impl<T, E> Default for RunOptions<T, E> {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancellation: None,
            timeout: None,
            rate_per_second: None,
        }
    }
}

impl<T, E> Clone for RunOptions<T, E> {
    fn clone(&self) -> Self {
        Self {
            on_progress: self.on_progress.clone(),
            cancellation: self.cancellation.clone(),
            timeout: self.timeout,
            rate_per_second: self.rate_per_second,
        }
    }
}

impl<T, E> fmt::Debug for RunOptions<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("on_progress", &self.on_progress.is_some())
            .field("cancellation", &self.cancellation)
            .field("timeout", &self.timeout)
            .field("rate_per_second", &self.rate_per_second)
            .finish()
    }
}

impl<T, E> RunOptions<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(
        mut self,
        on_progress: impl Fn(Progress<'_, T, E>) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// A zero duration disables the timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Zero disables the rate limit.
    pub fn with_rate_per_second(mut self, rate_per_second: Option<u32>) -> Self {
        self.rate_per_second = rate_per_second;
        self
    }

    /// Fills every unset field from `defaults`.
    pub fn merged_with(self, defaults: &Self) -> Self {
        Self {
            on_progress: self.on_progress.or_else(|| defaults.on_progress.clone()),
            cancellation: self.cancellation.or_else(|| defaults.cancellation.clone()),
            timeout: self.timeout.or(defaults.timeout),
            rate_per_second: self.rate_per_second.or(defaults.rate_per_second),
        }
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }

    pub(crate) fn rate_limit(&self) -> u32 {
        self.rate_per_second.unwrap_or_default()
    }

    pub(crate) fn checkpoint(&self) -> Result<(), RunError> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(RunError::Aborted {
                reason: token.reason().map(str::to_owned),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn report(&self, total: usize, results: &[TaskResult<T, E>]) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(Progress {
                done: results.len(),
                total,
                results,
            });
        }
    }
}
