use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::engine::errors::ScanError;
use crate::engine::store::DocumentStore;
use crate::engine::types::{DocumentRef, RawDocument, ScanFilter};

const LOG_TARGET: &str = "docshift::scan";

/// Receives scan results one page at a time.
#[async_trait]
pub trait PageConsumer: Send {
    async fn consume(&mut self, page: Vec<RawDocument>) -> Result<(), ScanError>;
}

#[async_trait]
impl PageConsumer for mpsc::Sender<Vec<RawDocument>> {
    async fn consume(&mut self, page: Vec<RawDocument>) -> Result<(), ScanError> {
        self.send(page).await.map_err(|_| ScanError::ConsumerClosed)
    }
}

/// Keeps every page in memory. Only suitable for small result sets.
#[async_trait]
impl PageConsumer for Vec<Vec<RawDocument>> {
    async fn consume(&mut self, page: Vec<RawDocument>) -> Result<(), ScanError> {
        self.push(page);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub pages: u64,
    pub documents: u64,
    pub cancelled: bool,
}

/// Sequential cursor scan over a store. The store does not support parallel
/// cursors, so there is exactly one fetch outstanding at a time.
pub struct DocumentScanner {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
    cancel: CancellationToken,
}

impl DocumentScanner {
    pub fn new(store: Arc<dyn DocumentStore>, page_size: usize, cancel: CancellationToken) -> Self {
        Self {
            store,
            page_size,
            cancel,
        }
    }

    pub async fn scan<C>(&self, filter: &ScanFilter, consumer: &mut C) -> Result<ScanReport, ScanError>
    where
        C: PageConsumer + ?Sized,
    {
        let mut cursor: Option<DocumentRef> = None;
        let mut report = ScanReport::default();

        loop {
            if self.cancel.is_cancelled() {
                info!(target: LOG_TARGET, pages = report.pages, "Scan cancelled");
                report.cancelled = true;
                break;
            }

            let page = self
                .store
                .fetch_page(filter, cursor.as_ref(), self.page_size)
                .await
                .map_err(|e| {
                    error!(target: LOG_TARGET, pages = report.pages, error = %e, "Page fetch failed");
                    ScanError::from_request(e, report.pages)
                })?;

            let count = page.documents.len();
            let exhausted = count < self.page_size || page.next.is_none();
            cursor = page
                .next
                .or_else(|| page.documents.last().map(|doc| doc.reference.clone()));

            report.pages += 1;
            report.documents += count as u64;
            debug!(target: LOG_TARGET, page = report.pages, documents = count, "Fetched page");

            if count > 0 {
                consumer.consume(page.documents).await?;
            }
            if exhausted {
                break;
            }
        }

        debug!(
            target: LOG_TARGET,
            pages = report.pages,
            documents = report.documents,
            "Scan finished"
        );
        Ok(report)
    }
}
