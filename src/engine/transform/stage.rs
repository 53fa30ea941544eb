use std::sync::Arc;

use tracing::warn;

use crate::engine::errors::TransformError;
use crate::engine::progress::ProgressTracker;
use crate::engine::types::{DocumentRef, RawDocument, WriteOperation};

const LOG_TARGET: &str = "docshift::transform";

/// Failures kept for the final report; the count is always exact.
const MAX_RECORDED_FAILURES: usize = 100;

/// A per-document rewrite. Must be pure: it may run concurrently and more
/// than once for the same document, and must return the same operations.
/// An empty result means the document needs no change.
pub trait Transform: Send + Sync {
    fn transform(&self, doc: &RawDocument) -> Result<Vec<WriteOperation>, TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&RawDocument) -> Result<Vec<WriteOperation>, TransformError> + Send + Sync,
{
    fn transform(&self, doc: &RawDocument) -> Result<Vec<WriteOperation>, TransformError> {
        self(doc)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub reference: DocumentRef,
    pub error: TransformError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformReport {
    pub documents: u64,
    pub unchanged: u64,
    pub failed: u64,
    pub operations: u64,
    pub failures: Vec<DocumentFailure>,
}

/// Runs the transform over scanned documents, isolating per-document errors.
pub struct TransformStage {
    transform: Arc<dyn Transform>,
    progress: Arc<ProgressTracker>,
    report: TransformReport,
}

impl TransformStage {
    pub fn new(transform: Arc<dyn Transform>, progress: Arc<ProgressTracker>) -> Self {
        Self {
            transform,
            progress,
            report: TransformReport::default(),
        }
    }

    pub fn apply(&mut self, doc: &RawDocument) -> Vec<WriteOperation> {
        self.report.documents += 1;
        self.progress.record_scanned(1);

        match self.transform.transform(doc) {
            Ok(ops) if ops.is_empty() => {
                self.report.unchanged += 1;
                ops
            }
            Ok(ops) => {
                self.report.operations += ops.len() as u64;
                ops
            }
            Err(error) => {
                warn!(
                    target: LOG_TARGET,
                    document = %doc.reference,
                    error = %error,
                    "Transform failed, skipping document"
                );
                self.report.failed += 1;
                self.progress.record_transform_failure();
                if self.report.failures.len() < MAX_RECORDED_FAILURES {
                    self.report.failures.push(DocumentFailure {
                        reference: doc.reference.clone(),
                        error,
                    });
                }
                Vec::new()
            }
        }
    }

    pub fn report(&self) -> &TransformReport {
        &self.report
    }

    pub fn into_report(self) -> TransformReport {
        self.report
    }
}
