use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error};

use crate::engine::types::DocumentRef;

/// Failure of a single store request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl RequestError {
    /// Timeouts and transport failures may succeed on a later attempt; a
    /// rejection will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestError::Timeout(_) | RequestError::Transport(_))
    }
}

/// Fatal scan failure. Skipping a page would leave data silently unmigrated,
/// so the run halts instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Query rejected by store: {0}")]
    Query(RequestError),

    #[error("Page fetch failed after {pages} pages: {source}")]
    Transport { pages: u64, source: RequestError },

    #[error("Page consumer closed before scan completed")]
    ConsumerClosed,
}

impl ScanError {
    pub fn from_request(err: RequestError, pages: u64) -> Self {
        match err {
            RequestError::Rejected(_) => ScanError::Query(err),
            _ => ScanError::Transport { pages, source: err },
        }
    }
}

/// Per-document failure raised by a transform. Recorded, never fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    #[error("Missing field '{field}' on {reference}")]
    MissingField {
        reference: DocumentRef,
        field: String,
    },

    #[error("Invalid field '{field}' on {reference}: {reason}")]
    InvalidField {
        reference: DocumentRef,
        field: String,
        reason: String,
    },

    #[error("Unsupported entity type '{entity_type}' on {reference}")]
    UnsupportedEntityType {
        reference: DocumentRef,
        entity_type: String,
    },

    #[error("Transform failed: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("max_batch_size must be greater than zero")]
    InvalidBatchSize,

    #[error("concurrency_limit must be greater than zero")]
    InvalidConcurrency,

    #[error("page_size must be greater than zero")]
    InvalidPageSize,

    #[error("bulk_timeout_ms must be greater than zero")]
    InvalidTimeout,

    #[error("Invalid retry policy: {0}")]
    InvalidRetry(String),
}

/// Engine fault in the apply stage. Store failures never surface here; they
/// are tallied in the apply summary.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Submission task could not be joined: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Apply failed: {0}")]
    Apply(#[from] ApplyError),

    #[error("Store unreachable: all {batches} batches ({operations} operations) failed")]
    Unreachable { batches: u64, operations: u64 },

    #[error("Error updating store: {0}")]
    Database(RequestError),

    #[error("Migration journal error: {0}")]
    Journal(String),

    #[error("Unknown migration: {0}")]
    UnknownMigration(String),
}

impl MigrationError {
    pub fn log_error(&self) {
        match self {
            MigrationError::Configuration(e) => {
                error!("Invalid migration configuration: {}", e);
                debug!("Configuration error details: {:?}", e);
            }
            MigrationError::Scan(e) => {
                error!("Scan failed: {}", e);
                debug!("Scan error details: {:?}", e);
            }
            MigrationError::Apply(e) => {
                error!("Apply stage failed: {}", e);
                debug!("Apply error details: {:?}", e);
            }
            MigrationError::Unreachable {
                batches,
                operations,
            } => {
                error!(
                    "Store unreachable: {} batches / {} operations failed",
                    batches, operations
                );
            }
            MigrationError::Database(e) => {
                error!("Error updating store: {}", e);
                debug!("Store error details: {:?}", e);
            }
            MigrationError::Journal(e) => {
                error!("Migration journal error: {}", e);
            }
            MigrationError::UnknownMigration(name) => {
                error!("Unknown migration: {}", name);
            }
        }
    }
}

/// Reading or writing a JSON file (store dumps, the migration journal).
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
