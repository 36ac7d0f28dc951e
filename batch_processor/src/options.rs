use crate::errors::BatchError;
use config::BatchConfig;
use std::time::Duration;

/// Per-call options for [`BatchProcessor::process_batch_with`](crate::BatchProcessor::process_batch_with)
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Maximum gateway calls in flight at once
    pub concurrency_limit: usize,
    /// TTL applied to results written back to the cache
    pub ttl: Duration,
    /// Limit for a single gateway call
    pub item_timeout: Option<Duration>,
    /// Deadline for the whole batch
    pub batch_timeout: Option<Duration>,
}

impl BatchOptions {
    pub fn new(concurrency_limit: usize, ttl: Duration) -> Self {
        Self {
            concurrency_limit,
            ttl,
            item_timeout: None,
            batch_timeout: None,
        }
    }

    /// Options from the `[batch]` config section, with the cache TTL supplied separately
    pub fn from_config(config: &BatchConfig, ttl: Duration) -> Self {
        Self {
            concurrency_limit: config.concurrency_limit,
            ttl,
            item_timeout: config.item_timeout(),
            batch_timeout: config.batch_timeout(),
        }
    }

    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = Some(timeout);
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.concurrency_limit < 1 {
            return Err(BatchError::InvalidArgument(format!(
                "concurrency_limit must be at least 1, got {}",
                self.concurrency_limit
            )));
        }
        if self.ttl.is_zero() {
            return Err(BatchError::InvalidArgument(
                "ttl must be greater than zero".to_string(),
            ));
        }
        if self.item_timeout.is_some_and(|t| t.is_zero()) {
            return Err(BatchError::InvalidArgument(
                "item_timeout must be greater than zero".to_string(),
            ));
        }
        if self.batch_timeout.is_some_and(|t| t.is_zero()) {
            return Err(BatchError::InvalidArgument(
                "batch_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
