use crate::{
    auto_traits::{TaskFailure, TaskValue},
    batcher::{DEFAULT_BATCH_SIZE, run_batched},
    config::LimiterConfig,
    error::RunError,
    limiter::RateLimiter,
    options::RunOptions,
    sequencer::run_sequential,
    task::TaskResult,
};

use std::sync::Arc;

/// Default options plus one rate limiter shared by every run started through
/// the pool, however many run at once. Clones share the same limiter.
///
/// Options passed to a single run override the pool's defaults field by
/// field. The limiter itself cannot be swapped per run.
pub struct Pool<T, E> {
    limiter: Arc<RateLimiter>,
    defaults: RunOptions<T, E>,
    batch_size: usize,
}

impl<T, E> Clone for Pool<T, E> {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            defaults: self.defaults.clone(),
            batch_size: self.batch_size,
        }
    }
}

impl<T: TaskValue, E: TaskFailure> Default for Pool<T, E> {
    fn default() -> Self {
        Self::new(RunOptions::default())
    }
}

impl<T: TaskValue, E: TaskFailure> Pool<T, E> {
    pub fn new(defaults: RunOptions<T, E>) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new()),
            defaults,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn from_config(config: &LimiterConfig) -> Self {
        Self::new(config.run_options()).with_batch_size(config.batch_size())
    }

    /// Batch size used when [`Pool::batched`] is given `None`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn defaults(&self) -> &RunOptions<T, E> {
        &self.defaults
    }

    pub async fn sequential<I, F, Fut>(
        &self,
        tasks: I,
        options: RunOptions<T, E>,
    ) -> Result<Vec<TaskResult<T, E>>, RunError>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let options = options.merged_with(&self.defaults);

        run_sequential(&self.limiter, tasks, &options).await
    }

    pub async fn batched<I, F, Fut>(
        &self,
        tasks: I,
        batch_size: Option<usize>,
        options: RunOptions<T, E>,
    ) -> Result<Vec<TaskResult<T, E>>, RunError>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let options = options.merged_with(&self.defaults);
        let batch_size = batch_size.unwrap_or(self.batch_size);

        run_batched(&self.limiter, tasks, batch_size, &options).await
    }
}
