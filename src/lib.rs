#![doc = include_str!("../README.md")]

mod auto_traits;
mod batcher;
mod cancel;
mod config;
mod error;
mod limiter;
mod options;
mod pool;
mod runner;
mod sequencer;
mod task;

pub use auto_traits::{TaskFailure, TaskValue};
pub use batcher::{DEFAULT_BATCH_SIZE, batched};
pub use cancel::CancellationToken;
pub use config::LimiterConfig;
pub use error::{Rejection, RunError};
pub use limiter::RateLimiter;
pub use options::{Progress, ProgressCallback, RunOptions};
pub use pool::Pool;
pub use sequencer::sequential;
pub use task::{Task, TaskResult, task};
