use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub engine: EngineConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub store: StoreConfig,
    pub migrations: MigrationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Operations per bulk request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Bulk requests in flight at once
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_bulk_timeout_ms")]
    pub bulk_timeout_ms: u64,
    #[serde(default = "default_refresh")]
    pub refresh: bool,
    /// Emit a progress line every N processed operations (0 = every batch)
    #[serde(default)]
    pub progress_stride: u64,
}

fn default_max_batch_size() -> usize {
    300
}

fn default_concurrency_limit() -> usize {
    4
}

fn default_page_size() -> usize {
    500
}

fn default_bulk_timeout_ms() -> u64 {
    300_000
}

fn default_refresh() -> bool {
    true
}

/// Backoff for request-level bulk failures. Scans are never retried here.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// JSON dump backing the in-memory store
    pub data_file: String,
}

#[derive(Debug, Deserialize)]
pub struct MigrationsConfig {
    pub journal_file: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("DOCSHIFT_CONFIG").unwrap_or_else(|_| "config".to_string());
    load_settings_from(&config_path)
}

pub fn load_settings_from(config_path: &str) -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(config_path))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
