//! Runs a single task and settles its outcome.
//!
//! A timeout only changes what gets reported. When the timer wins, the task
//! has already been spawned onto the runtime and is detached, not aborted: it
//! keeps running to completion in the background and its output is dropped.
//! Actually stopping the work would need the task itself to take a
//! cancellation signal, which plain futures handed to this crate do not.

use crate::{
    auto_traits::{TaskFailure, TaskValue},
    error::Rejection,
    task::TaskResult,
};

use std::{panic, time::Duration};
use tokio::{task::JoinError, time::sleep};
use tracing::{trace, warn};

pub(crate) async fn run_with_timeout<T, E, F, Fut>(
    task: F,
    timeout: Option<Duration>,
) -> Result<T, Rejection<E>>
where
    T: TaskValue,
    E: TaskFailure,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let Some(timeout) = timeout.filter(|timeout| !timeout.is_zero()) else {
        return task().await.map_err(Rejection::Failed);
    };

    let mut handle = tokio::spawn(task());

    tokio::select! {
        joined = &mut handle => settle_joined(joined),
        _ = sleep(timeout) => {
            warn!(?timeout, "task timed out, leaving it running in the background");
            drop(handle);
            Err(Rejection::Timeout(timeout))
        }
    }
}

fn settle_joined<T, E>(joined: Result<Result<T, E>, JoinError>) -> Result<T, Rejection<E>> {
    match joined {
        Ok(result) => result.map_err(Rejection::Failed),
        Err(error) if error.is_panic() => panic::resume_unwind(error.into_panic()),
        // The handle is never aborted here, so this is the runtime dropping it.
        Err(error) => {
            warn!(%error, "task dropped before it settled");
            Err(Rejection::Lost)
        }
    }
}

pub(crate) async fn run_settled<T, E, F, Fut>(
    task: F,
    timeout: Option<Duration>,
) -> TaskResult<T, E>
where
    T: TaskValue,
    E: TaskFailure,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let result: TaskResult<T, E> = run_with_timeout(task, timeout).await.into();

    trace!(fulfilled = result.is_fulfilled(), "task settled");

    result
}
