use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::errors::RequestError;
use crate::engine::types::{DocumentRef, Fields, RawDocument, ScanFilter, WriteOperation};

/// One page of scan results. `next` is the cursor to resume after, `None`
/// when the store knows the result set is exhausted.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub documents: Vec<RawDocument>,
    pub next: Option<DocumentRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    pub action: BulkAction,
    pub reference: DocumentRef,
    pub patch: Fields,
}

impl From<WriteOperation> for BulkOperation {
    fn from(op: WriteOperation) -> Self {
        Self {
            action: BulkAction::Update,
            reference: op.reference,
            patch: op.patch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOptions {
    /// Make the writes visible to search before the request returns.
    pub refresh: bool,
    pub timeout: Duration,
}

/// Per-item result of a bulk request, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemOutcome {
    pub reference: DocumentRef,
    pub error: Option<String>,
}

impl BulkItemOutcome {
    pub fn ok(reference: DocumentRef) -> Self {
        Self {
            reference,
            error: None,
        }
    }

    pub fn failed(reference: DocumentRef, error: impl Into<String>) -> Self {
        Self {
            reference,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    Abort,
    Proceed,
}

/// A server-side script: its source and the parameters it is invoked with.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub source: String,
    pub params: Fields,
}

impl Script {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            params: Fields::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateByQuery {
    pub filter: ScanFilter,
    pub script: Script,
    pub refresh: bool,
    pub conflicts: ConflictPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateByQueryReport {
    pub total: u64,
    pub updated: u64,
    pub noops: u64,
    pub version_conflicts: u64,
}

/// The narrow surface of a document store that migrations depend on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches up to `page_size` documents matching `filter`, strictly after
    /// `after` in (container, id) order.
    async fn fetch_page(
        &self,
        filter: &ScanFilter,
        after: Option<&DocumentRef>,
        page_size: usize,
    ) -> Result<Page, RequestError>;

    /// Applies `operations` in order. A request-level `Err` means nothing can
    /// be assumed about the batch; per-item failures come back as outcomes.
    async fn bulk_write(
        &self,
        operations: &[BulkOperation],
        options: &BulkOptions,
    ) -> Result<Vec<BulkItemOutcome>, RequestError>;

    /// Rewrites every matching document server-side as one job.
    async fn update_by_query(
        &self,
        request: &UpdateByQuery,
    ) -> Result<UpdateByQueryReport, RequestError>;
}
