//! Store wrappers that inject failures and observe concurrency.

use crate::engine::errors::RequestError;
use crate::engine::store::{
    BulkItemOutcome, BulkOperation, BulkOptions, DocumentStore, MemoryStore, Page, UpdateByQuery,
    UpdateByQueryReport,
};
use crate::engine::types::{DocumentRef, ScanFilter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Delegates to a `MemoryStore` and fails on demand.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    poisoned: HashSet<DocumentRef>,
    panic_on: Option<DocumentRef>,
    transient_failures: AtomicU64,
    fail_pages_after: Option<u64>,
    reject_bulks: bool,
    bulk_delay: Option<Duration>,
    pages_served: AtomicU64,
    bulk_attempts: AtomicU64,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            poisoned: HashSet::new(),
            panic_on: None,
            transient_failures: AtomicU64::new(0),
            fail_pages_after: None,
            reject_bulks: false,
            bulk_delay: None,
            pages_served: AtomicU64::new(0),
            bulk_attempts: AtomicU64::new(0),
        }
    }

    /// Every bulk request containing `reference` fails with a transport error.
    pub fn poison(mut self, reference: DocumentRef) -> Self {
        self.poisoned.insert(reference);
        self
    }

    pub fn panic_on(mut self, reference: DocumentRef) -> Self {
        self.panic_on = Some(reference);
        self
    }

    /// The first `count` bulk requests fail with a transport error.
    pub fn fail_first_bulks(self, count: u64) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Page fetches after the first `pages` fail with a transport error.
    pub fn fail_pages_after(mut self, pages: u64) -> Self {
        self.fail_pages_after = Some(pages);
        self
    }

    /// Every bulk request is rejected.
    pub fn reject_bulks(mut self) -> Self {
        self.reject_bulks = true;
        self
    }

    pub fn with_bulk_delay(mut self, delay: Duration) -> Self {
        self.bulk_delay = Some(delay);
        self
    }

    pub fn bulk_attempts(&self) -> u64 {
        self.bulk_attempts.load(Ordering::SeqCst)
    }

    pub fn pages_served(&self) -> u64 {
        self.pages_served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn fetch_page(
        &self,
        filter: &ScanFilter,
        after: Option<&DocumentRef>,
        page_size: usize,
    ) -> Result<Page, RequestError> {
        let served = self.pages_served.load(Ordering::SeqCst);
        if self.fail_pages_after.is_some_and(|limit| served >= limit) {
            return Err(RequestError::Transport("connection reset".into()));
        }
        let page = self.inner.fetch_page(filter, after, page_size).await?;
        self.pages_served.fetch_add(1, Ordering::SeqCst);
        Ok(page)
    }

    async fn bulk_write(
        &self,
        operations: &[BulkOperation],
        options: &BulkOptions,
    ) -> Result<Vec<BulkItemOutcome>, RequestError> {
        self.bulk_attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.bulk_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(target) = &self.panic_on {
            if operations.iter().any(|op| &op.reference == target) {
                panic!("store blew up on {target}");
            }
        }
        if self.reject_bulks {
            return Err(RequestError::Rejected("index is read-only".into()));
        }
        if operations
            .iter()
            .any(|op| self.poisoned.contains(&op.reference))
        {
            return Err(RequestError::Transport("node unavailable".into()));
        }
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RequestError::Transport("connection refused".into()));
        }

        self.inner.bulk_write(operations, options).await
    }

    async fn update_by_query(
        &self,
        request: &UpdateByQuery,
    ) -> Result<UpdateByQueryReport, RequestError> {
        self.inner.update_by_query(request).await
    }
}

/// Delegates to a `MemoryStore`, holding each bulk request open for `delay`
/// and recording the highest number of concurrent requests.
pub struct GaugeStore {
    inner: Arc<MemoryStore>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: Mutex<Vec<Instant>>,
    completed: Mutex<Vec<usize>>,
}

impl GaugeStore {
    pub fn new(inner: Arc<MemoryStore>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// When each bulk request reached the store, in arrival order.
    pub fn started_at(&self) -> Vec<Instant> {
        self.started.lock().clone()
    }

    /// Sizes of the bulk requests in completion order.
    pub fn completed_sizes(&self) -> Vec<usize> {
        self.completed.lock().clone()
    }
}

#[async_trait]
impl DocumentStore for GaugeStore {
    async fn fetch_page(
        &self,
        filter: &ScanFilter,
        after: Option<&DocumentRef>,
        page_size: usize,
    ) -> Result<Page, RequestError> {
        self.inner.fetch_page(filter, after, page_size).await
    }

    async fn bulk_write(
        &self,
        operations: &[BulkOperation],
        options: &BulkOptions,
    ) -> Result<Vec<BulkItemOutcome>, RequestError> {
        self.started.lock().push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let result = self.inner.bulk_write(operations, options).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().push(operations.len());
        result
    }

    async fn update_by_query(
        &self,
        request: &UpdateByQuery,
    ) -> Result<UpdateByQueryReport, RequestError> {
        self.inner.update_by_query(request).await
    }
}
