use std::time::Duration;

use crate::engine::apply::RetryPolicy;
use crate::engine::errors::ConfigurationError;
use crate::engine::store::BulkOptions;
use crate::shared::config::Settings;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 300;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;
pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_BULK_TIMEOUT: Duration = Duration::from_secs(300);

/// Tuning for one streaming migration run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOptions {
    pub max_batch_size: usize,
    pub concurrency_limit: usize,
    pub page_size: usize,
    pub bulk_timeout: Duration,
    pub refresh: bool,
    pub progress_stride: u64,
    pub retry: RetryPolicy,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            bulk_timeout: DEFAULT_BULK_TIMEOUT,
            refresh: true,
            progress_stride: 0,
            retry: RetryPolicy::default(),
        }
    }
}

impl MigrationOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let engine = &settings.engine;
        Self {
            max_batch_size: engine.max_batch_size,
            concurrency_limit: engine.concurrency_limit,
            page_size: engine.page_size,
            bulk_timeout: Duration::from_millis(engine.bulk_timeout_ms),
            refresh: engine.refresh,
            progress_stride: engine.progress_stride,
            retry: RetryPolicy::from_config(&settings.retry),
        }
    }

    /// Checked before any page is fetched.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize);
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigurationError::InvalidConcurrency);
        }
        if self.page_size == 0 {
            return Err(ConfigurationError::InvalidPageSize);
        }
        if self.bulk_timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout);
        }
        self.retry.validate()
    }

    pub fn bulk_options(&self) -> BulkOptions {
        BulkOptions {
            refresh: self.refresh,
            timeout: self.bulk_timeout,
        }
    }
}
