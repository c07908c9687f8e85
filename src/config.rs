use crate::{batcher::DEFAULT_BATCH_SIZE, options::RunOptions};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serializable scheduler settings, e.g. read from a config file.
///
/// Every field is optional. Zero timeout or rate means none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    pub timeout_ms: Option<u64>,
    pub rate_per_second: Option<u32>,
    pub batch_size: Option<usize>,
}

impl LimiterConfig {
    pub fn run_options<T, E>(&self) -> RunOptions<T, E> {
        RunOptions::new()
            .with_timeout(self.timeout_ms.map(Duration::from_millis))
            .with_rate_per_second(self.rate_per_second)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }
}
