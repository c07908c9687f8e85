use crate::{
    auto_traits::{TaskFailure, TaskValue},
    error::RunError,
    limiter::RateLimiter,
    options::RunOptions,
    runner::run_settled,
    task::TaskResult,
};

use tracing::{debug, info, trace};

/// Runs `tasks` one at a time in input order with a private rate limiter.
///
/// Task failures and timeouts are settled into the returned results. The run
/// itself only fails when the cancellation token is observed at a checkpoint,
/// which happens before each dispatch and again after its rate-limit wait. A
/// task already running when the token is set finishes first.
pub async fn sequential<T, E, I, F, Fut>(
    tasks: I,
    options: RunOptions<T, E>,
) -> Result<Vec<TaskResult<T, E>>, RunError>
where
    T: TaskValue,
    E: TaskFailure,
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    run_sequential(&RateLimiter::new(), tasks, &options).await
}

pub(crate) async fn run_sequential<T, E, I, F, Fut>(
    limiter: &RateLimiter,
    tasks: I,
    options: &RunOptions<T, E>,
) -> Result<Vec<TaskResult<T, E>>, RunError>
where
    T: TaskValue,
    E: TaskFailure,
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let tasks: Vec<F> = tasks.into_iter().collect();
    let total = tasks.len();
    let mut results = Vec::with_capacity(total);

    for (index, task) in tasks.into_iter().enumerate() {
        abort_if_cancelled(options, index, total)?;

        limiter.acquire(options.rate_limit()).await;

        abort_if_cancelled(options, index, total)?;

        trace!(index, total, "dispatching task");
        results.push(run_settled(task, options.timeout()).await);

        options.report(total, &results);
    }

    debug!(total, "sequential run completed");

    Ok(results)
}

fn abort_if_cancelled<T, E>(
    options: &RunOptions<T, E>,
    index: usize,
    total: usize,
) -> Result<(), RunError> {
    options.checkpoint().inspect_err(|error| {
        info!(index, total, %error, "sequential run aborted");
    })
}
