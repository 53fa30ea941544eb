use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::retry::RetryPolicy;
use super::summary::{ApplySummary, BatchOutcome, OperationFailure};
use crate::engine::errors::{ApplyError, ConfigurationError, RequestError};
use crate::engine::progress::ProgressTracker;
use crate::engine::store::{BulkItemOutcome, BulkOperation, BulkOptions, DocumentStore};
use crate::engine::types::{Batch, DocumentRef};

const LOG_TARGET: &str = "docshift::apply";

/// Submits batches to the store's bulk endpoint with at most
/// `concurrency_limit` requests in flight.
///
/// The dispatcher owns the in-flight set. A batch that touches a document
/// held by an in-flight batch waits for it, which keeps per-document
/// operation order across batch boundaries. Everything else may complete in
/// any order.
pub struct ConcurrentApplier {
    store: Arc<dyn DocumentStore>,
    concurrency_limit: usize,
    bulk: BulkOptions,
    retry: RetryPolicy,
    progress: Arc<ProgressTracker>,
    cancel: CancellationToken,
}

impl ConcurrentApplier {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        concurrency_limit: usize,
        bulk: BulkOptions,
        retry: RetryPolicy,
        progress: Arc<ProgressTracker>,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigurationError> {
        if concurrency_limit == 0 {
            return Err(ConfigurationError::InvalidConcurrency);
        }
        if bulk.timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout);
        }
        retry.validate()?;
        Ok(Self {
            store,
            concurrency_limit,
            bulk,
            retry,
            progress,
            cancel,
        })
    }

    /// Applies an already materialized list of batches.
    pub async fn apply(&self, batches: Vec<Batch>) -> Result<ApplySummary, ApplyError> {
        let (tx, rx) = mpsc::channel(batches.len().max(1));
        for batch in batches {
            let queued = tx.try_send(batch);
            debug_assert!(queued.is_ok(), "channel is sized for every batch");
        }
        drop(tx);
        self.apply_stream(rx).await
    }

    /// Drains `batches` until the sender side closes or the run is cancelled.
    pub async fn apply_stream(
        &self,
        mut batches: mpsc::Receiver<Batch>,
    ) -> Result<ApplySummary, ApplyError> {
        let mut summary = ApplySummary::default();
        let mut in_flight: JoinSet<BatchOutcome> = JoinSet::new();
        let mut held: HashMap<u64, HashSet<DocumentRef>> = HashMap::new();

        loop {
            while in_flight.len() >= self.concurrency_limit {
                join_one(&mut in_flight, &mut held, &mut summary).await?;
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                batch = batches.recv() => batch,
            };
            let Some(batch) = next else { break };

            let refs = batch.refs();
            while !in_flight.is_empty() && held.values().any(|h| !h.is_disjoint(&refs)) {
                debug!(target: LOG_TARGET, batch = batch.seq(), "Waiting on overlapping batch");
                join_one(&mut in_flight, &mut held, &mut summary).await?;
            }

            if self.cancel.is_cancelled() {
                summary.operations_skipped += batch.len() as u64;
                break;
            }

            let operations = batch.len() as u64;
            held.insert(batch.seq(), refs);
            summary.batches_submitted += 1;
            summary.operations_submitted += operations;
            self.progress.record_submitted(operations);
            debug!(target: LOG_TARGET, batch = batch.seq(), operations, "Submitting batch");

            in_flight.spawn(run_submission(
                Arc::clone(&self.store),
                batch,
                self.bulk,
                self.retry,
                Arc::clone(&self.progress),
                self.cancel.clone(),
            ));
        }

        // Anything still queued upstream is dropped unsubmitted.
        batches.close();
        while let Some(batch) = batches.recv().await {
            summary.operations_skipped += batch.len() as u64;
        }

        while !in_flight.is_empty() {
            join_one(&mut in_flight, &mut held, &mut summary).await?;
        }

        summary.cancelled = self.cancel.is_cancelled();
        if summary.cancelled {
            info!(
                target: LOG_TARGET,
                skipped = summary.operations_skipped,
                "Apply stopped by cancellation"
            );
        }
        Ok(summary)
    }
}

async fn join_one(
    in_flight: &mut JoinSet<BatchOutcome>,
    held: &mut HashMap<u64, HashSet<DocumentRef>>,
    summary: &mut ApplySummary,
) -> Result<(), ApplyError> {
    match in_flight.join_next().await {
        Some(Ok(outcome)) => {
            held.remove(&outcome.seq());
            summary.absorb(outcome);
            Ok(())
        }
        Some(Err(e)) => Err(ApplyError::Join(e.to_string())),
        None => Ok(()),
    }
}

async fn run_submission(
    store: Arc<dyn DocumentStore>,
    batch: Batch,
    bulk: BulkOptions,
    retry: RetryPolicy,
    progress: Arc<ProgressTracker>,
    cancel: CancellationToken,
) -> BatchOutcome {
    let seq = batch.seq();
    let operations = batch.len() as u64;

    let submission = submit_batch(store.as_ref(), batch, &bulk, &retry, &cancel);
    let outcome = match AssertUnwindSafe(submission).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_panic) => {
            error!(target: LOG_TARGET, batch = seq, "Submission panicked");
            BatchOutcome::Failed {
                seq,
                operations,
                attempts: 1,
                reason: "submission panicked".to_string(),
            }
        }
    };

    match &outcome {
        BatchOutcome::Completed {
            applied, failed, ..
        } => progress.record(*applied, *failed),
        BatchOutcome::Failed { operations, .. } | BatchOutcome::Cancelled { operations, .. } => {
            progress.record(0, *operations)
        }
    }
    outcome
}

async fn submit_batch(
    store: &dyn DocumentStore,
    batch: Batch,
    bulk: &BulkOptions,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> BatchOutcome {
    let seq = batch.seq();
    let ops: Vec<BulkOperation> = batch
        .into_operations()
        .into_iter()
        .map(BulkOperation::from)
        .collect();
    let mut attempt: u32 = 0;

    loop {
        // A request already sent runs to completion; a new one never starts
        // after cancellation.
        if cancel.is_cancelled() {
            info!(
                target: LOG_TARGET,
                batch = seq,
                attempts = attempt,
                "Batch abandoned by cancellation"
            );
            return BatchOutcome::Cancelled {
                seq,
                operations: ops.len() as u64,
                attempts: attempt,
            };
        }

        attempt += 1;
        let result = match timeout(bulk.timeout, store.bulk_write(&ops, bulk)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(RequestError::Timeout(bulk.timeout)),
        };

        match result {
            Ok(items) => return completed(seq, &ops, items, attempt - 1),
            Err(e) if e.is_retryable() && attempt <= retry.max_retries => {
                let delay = retry.jittered_backoff(attempt - 1);
                warn!(
                    target: LOG_TARGET,
                    batch = seq,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Bulk request failed, retrying"
                );
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = cancel.cancelled() => {}
                }
            }
            Err(e) => {
                error!(
                    target: LOG_TARGET,
                    batch = seq,
                    attempts = attempt,
                    operations = ops.len(),
                    error = %e,
                    "Bulk request failed, marking batch as failed"
                );
                return BatchOutcome::Failed {
                    seq,
                    operations: ops.len() as u64,
                    attempts: attempt,
                    reason: e.to_string(),
                };
            }
        }
    }
}

/// Pairs item outcomes with the request by position. Items the store did not
/// report on count as failed.
fn completed(
    seq: u64,
    ops: &[BulkOperation],
    items: Vec<BulkItemOutcome>,
    retries: u32,
) -> BatchOutcome {
    let mut failures = Vec::new();
    let mut items = items.into_iter();

    for op in ops {
        let reason = match items.next() {
            Some(item) => match item.error {
                Some(reason) => reason,
                None => continue,
            },
            None => "no outcome reported".to_string(),
        };
        failures.push(OperationFailure {
            batch: seq,
            reference: op.reference.clone(),
            reason,
        });
    }

    if !failures.is_empty() {
        warn!(
            target: LOG_TARGET,
            batch = seq,
            failed = failures.len(),
            "Bulk request reported per-operation failures"
        );
    }

    let failed = failures.len() as u64;
    BatchOutcome::Completed {
        seq,
        applied: ops.len() as u64 - failed,
        failed,
        retries,
        failures,
    }
}
