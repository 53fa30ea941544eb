use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::options::MigrationOptions;
use super::state::MigrationState;
use crate::engine::apply::{ApplySummary, ConcurrentApplier};
use crate::engine::batch::BatchBuilder;
use crate::engine::errors::{MigrationError, ScanError};
use crate::engine::progress::{ProgressState, ProgressTracker};
use crate::engine::scan::{DocumentScanner, ScanReport};
use crate::engine::store::DocumentStore;
use crate::engine::transform::{Transform, TransformReport, TransformStage};
use crate::engine::types::{Batch, RawDocument, ScanFilter};

const LOG_TARGET: &str = "docshift::migration";

/// Outcome of a completed streaming run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationReport {
    pub name: String,
    pub state: MigrationState,
    pub progress: ProgressState,
    pub scan: ScanReport,
    pub transform: TransformReport,
    pub apply: ApplySummary,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

/// Runs one streaming migration step: scan → transform → batch → apply.
///
/// The stages run concurrently and are joined by bounded channels, so memory
/// stays proportional to one page plus the batches in flight. Document and
/// batch failures are tallied in the report; only scan failures, invalid
/// options and an unreachable store fail the run.
pub struct MigrationRunner {
    name: String,
    store: Arc<dyn DocumentStore>,
    filter: ScanFilter,
    transform: Arc<dyn Transform>,
    options: MigrationOptions,
    cancel: CancellationToken,
    state: watch::Sender<MigrationState>,
}

impl MigrationRunner {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        filter: ScanFilter,
        transform: Arc<dyn Transform>,
        options: MigrationOptions,
    ) -> Self {
        let (state, _) = watch::channel(MigrationState::Pending);
        Self {
            name: name.into(),
            store,
            filter,
            transform,
            options,
            cancel: CancellationToken::new(),
            state,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancelling stops new page fetches and batch submissions; requests
    /// already in flight run to completion.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> MigrationState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<MigrationState> {
        self.state.subscribe()
    }

    pub async fn up(&self) -> Result<MigrationReport, MigrationError> {
        let started = Instant::now();
        self.state.send_replace(MigrationState::Pending);
        info!(target: LOG_TARGET, "[MIGRATION] Starting {}", self.name);

        if let Err(e) = self.options.validate() {
            self.transition(MigrationState::Failed);
            error!(target: LOG_TARGET, "[MIGRATION] {} rejected: {}", self.name, e);
            return Err(e.into());
        }

        let run_cancel = self.cancel.child_token();
        let progress = Arc::new(ProgressTracker::new(
            self.name.clone(),
            self.options.progress_stride,
        ));
        let scanner = DocumentScanner::new(
            Arc::clone(&self.store),
            self.options.page_size,
            run_cancel.clone(),
        );
        let applier = ConcurrentApplier::new(
            Arc::clone(&self.store),
            self.options.concurrency_limit,
            self.options.bulk_options(),
            self.options.retry,
            Arc::clone(&progress),
            run_cancel.clone(),
        )?;
        let builder = BatchBuilder::new(self.options.max_batch_size)?;
        let stage = TransformStage::new(Arc::clone(&self.transform), Arc::clone(&progress));

        self.transition(MigrationState::Scanning);

        let (page_tx, page_rx) = mpsc::channel::<Vec<RawDocument>>(1);
        let (batch_tx, batch_rx) = mpsc::channel::<Batch>(1);

        let scan = async {
            let mut page_tx = page_tx;
            let result = match scanner.scan(&self.filter, &mut page_tx).await {
                // Downstream only hangs up early when the run was cancelled.
                Err(ScanError::ConsumerClosed) if run_cancel.is_cancelled() => Ok(ScanReport {
                    cancelled: true,
                    ..Default::default()
                }),
                other => other,
            };
            match &result {
                Ok(_) => self.transition(MigrationState::Applying),
                Err(_) => run_cancel.cancel(),
            }
            result
        };
        let batching = transform_and_batch(page_rx, stage, builder, batch_tx);
        let apply = applier.apply_stream(batch_rx);

        let (scan_result, transform_report, apply_result) = tokio::join!(scan, batching, apply);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let scan_report = match scan_result {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e.into(), elapsed_ms)),
        };
        let apply_summary = match apply_result {
            Ok(summary) => summary,
            Err(e) => return Err(self.fail(e.into(), elapsed_ms)),
        };
        if apply_summary.store_unreachable() {
            let err = MigrationError::Unreachable {
                batches: apply_summary.batches_failed,
                operations: apply_summary.operations_failed,
            };
            return Err(self.fail(err, elapsed_ms));
        }

        self.transition(MigrationState::Completed);
        let state = progress.snapshot();
        let cancelled = scan_report.cancelled || apply_summary.cancelled;

        if cancelled {
            warn!(
                target: LOG_TARGET,
                "[MIGRATION] {} cancelled after {} ms",
                self.name,
                elapsed_ms
            );
        }
        info!(
            target: LOG_TARGET,
            scanned = state.total_scanned,
            submitted = state.total_submitted,
            applied = state.total_applied,
            failed = state.total_failed,
            transform_failed = state.transform_failed,
            "[MIGRATION] {} done in {} ms: {} applied, {} failed",
            self.name,
            elapsed_ms,
            state.total_applied,
            state.total_failed
        );

        Ok(MigrationReport {
            name: self.name.clone(),
            state: MigrationState::Completed,
            progress: state,
            scan: scan_report,
            transform: transform_report,
            apply: apply_summary,
            cancelled,
            elapsed_ms,
        })
    }

    /// Streaming migrations only add or rewrite fields and are one-way:
    /// rollback leaves every document untouched.
    pub async fn down(&self) -> Result<(), MigrationError> {
        info!(target: LOG_TARGET, "[MIGRATION] {} down: nothing to revert", self.name);
        Ok(())
    }

    fn transition(&self, next: MigrationState) {
        let current = self.state();
        if current.can_transition_to(next) {
            self.state.send_replace(next);
        } else {
            warn!(
                target: LOG_TARGET,
                migration = %self.name,
                from = %current,
                to = %next,
                "Ignoring invalid state transition"
            );
        }
    }

    fn fail(&self, err: MigrationError, elapsed_ms: u64) -> MigrationError {
        self.transition(MigrationState::Failed);
        err.log_error();
        error!(
            target: LOG_TARGET,
            "[MIGRATION] {} failed after {} ms: {}",
            self.name,
            elapsed_ms,
            err
        );
        err
    }
}

/// Middle stage: transforms each scanned document and cuts the resulting
/// operations into batches. Stops early if the applier hangs up.
async fn transform_and_batch(
    mut pages: mpsc::Receiver<Vec<RawDocument>>,
    mut stage: TransformStage,
    mut builder: BatchBuilder,
    batches: mpsc::Sender<Batch>,
) -> TransformReport {
    while let Some(page) = pages.recv().await {
        for doc in &page {
            for batch in builder.extend(stage.apply(doc)) {
                if batches.send(batch).await.is_err() {
                    return stage.into_report();
                }
            }
        }
    }

    if let Some(batch) = builder.finish() {
        let _ = batches.send(batch).await;
    }
    stage.into_report()
}
