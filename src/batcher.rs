use crate::{
    auto_traits::{TaskFailure, TaskValue},
    error::RunError,
    limiter::RateLimiter,
    options::RunOptions,
    runner::run_settled,
    task::TaskResult,
};

use futures::{StreamExt, stream::FuturesUnordered};
use tracing::{debug, info, trace};

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Runs `tasks` in consecutive batches of `batch_size` with a private rate
/// limiter. A `batch_size` of zero is treated as one.
///
/// All tasks of a batch are in flight together, each waiting for the rate
/// limiter on its own right before it starts. Cancellation is only checked
/// before a batch starts: once dispatched, a batch always runs to settlement.
///
/// The progress callback fires once per settled task and once more when a
/// batch completes.
pub async fn batched<T, E, I, F, Fut>(
    tasks: I,
    batch_size: usize,
    options: RunOptions<T, E>,
) -> Result<Vec<TaskResult<T, E>>, RunError>
where
    T: TaskValue,
    E: TaskFailure,
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    run_batched(&RateLimiter::new(), tasks, batch_size, &options).await
}

pub(crate) async fn run_batched<T, E, I, F, Fut>(
    limiter: &RateLimiter,
    tasks: I,
    batch_size: usize,
    options: &RunOptions<T, E>,
) -> Result<Vec<TaskResult<T, E>>, RunError>
where
    T: TaskValue,
    E: TaskFailure,
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    if batch_size == 0 {
        debug!("batch size of zero, running batches of one");
    }

    let batch_size = batch_size.max(1);
    let tasks: Vec<F> = tasks.into_iter().collect();
    let total = tasks.len();
    let mut tasks = tasks.into_iter();
    let mut results = Vec::with_capacity(total);
    let mut start = 0;

    while start < total {
        options.checkpoint().inspect_err(|error| {
            info!(start, total, %error, "batched run aborted");
        })?;

        let mut in_flight: FuturesUnordered<_> = tasks
            .by_ref()
            .take(batch_size)
            .enumerate()
            .map(move |(offset, task)| {
                let index = start + offset;
                async move {
                    limiter.acquire(options.rate_limit()).await;
                    trace!(index, total, "dispatching task");
                    (index, run_settled(task, options.timeout()).await)
                }
            })
            .collect();

        let mut settled_order = Vec::with_capacity(in_flight.len());

        while let Some((index, result)) = in_flight.next().await {
            settled_order.push(index);
            results.push(result);
            options.report(total, &results);
        }

        let mut batch: Vec<_> = settled_order
            .into_iter()
            .zip(results.drain(start..))
            .collect();
        batch.sort_unstable_by_key(|(index, _)| *index);
        results.extend(batch.into_iter().map(|(_, result)| result));

        debug!(start, done = results.len(), total, "batch completed");
        options.report(total, &results);

        start = results.len();
    }

    debug!(total, batch_size, "batched run completed");

    Ok(results)
}
