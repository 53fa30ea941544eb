use crate::engine::types::DocumentRef;

/// Failure samples kept per kind; counters stay exact beyond this.
const MAX_RECORDED_FAILURES: usize = 100;

/// An operation the store rejected inside an otherwise successful request.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFailure {
    pub batch: u64,
    pub reference: DocumentRef,
    pub reason: String,
}

/// A batch whose request failed as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub batch: u64,
    pub operations: u64,
    pub attempts: u32,
    pub reason: String,
}

/// Result of one submission task.
#[derive(Debug)]
pub enum BatchOutcome {
    Completed {
        seq: u64,
        applied: u64,
        failed: u64,
        retries: u32,
        failures: Vec<OperationFailure>,
    },
    Failed {
        seq: u64,
        operations: u64,
        attempts: u32,
        reason: String,
    },
    /// Stopped between attempts because the run was cancelled. Nothing from
    /// this batch is known to have been applied.
    Cancelled {
        seq: u64,
        operations: u64,
        attempts: u32,
    },
}

impl BatchOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            BatchOutcome::Completed { seq, .. }
            | BatchOutcome::Failed { seq, .. }
            | BatchOutcome::Cancelled { seq, .. } => *seq,
        }
    }
}

/// Aggregated tally of an apply run. Failures are collected here instead of
/// being propagated, so one bad batch never stops the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplySummary {
    pub batches_submitted: u64,
    pub batches_failed: u64,
    /// Abandoned mid-retry by cancellation; their operations count as failed.
    pub batches_cancelled: u64,
    pub operations_submitted: u64,
    pub operations_applied: u64,
    pub operations_failed: u64,
    /// Built but never submitted because the run was cancelled.
    pub operations_skipped: u64,
    pub retries: u64,
    pub cancelled: bool,
    pub operation_failures: Vec<OperationFailure>,
    pub batch_failures: Vec<BatchFailure>,
}

impl ApplySummary {
    pub fn absorb(&mut self, outcome: BatchOutcome) {
        match outcome {
            BatchOutcome::Completed {
                applied,
                failed,
                retries,
                failures,
                ..
            } => {
                self.operations_applied += applied;
                self.operations_failed += failed;
                self.retries += u64::from(retries);
                let room = MAX_RECORDED_FAILURES.saturating_sub(self.operation_failures.len());
                self.operation_failures
                    .extend(failures.into_iter().take(room));
            }
            BatchOutcome::Failed {
                seq,
                operations,
                attempts,
                reason,
            } => {
                self.batches_failed += 1;
                self.operations_failed += operations;
                self.retries += u64::from(attempts.saturating_sub(1));
                if self.batch_failures.len() < MAX_RECORDED_FAILURES {
                    self.batch_failures.push(BatchFailure {
                        batch: seq,
                        operations,
                        attempts,
                        reason,
                    });
                }
            }
            BatchOutcome::Cancelled {
                seq,
                operations,
                attempts,
            } => {
                self.batches_cancelled += 1;
                self.operations_failed += operations;
                self.retries += u64::from(attempts.saturating_sub(1));
                if self.batch_failures.len() < MAX_RECORDED_FAILURES {
                    self.batch_failures.push(BatchFailure {
                        batch: seq,
                        operations,
                        attempts,
                        reason: "cancelled".to_string(),
                    });
                }
            }
        }
    }

    /// True when batches were sent and not one of them reached the store.
    /// Batches abandoned by cancellation say nothing about reachability.
    pub fn store_unreachable(&self) -> bool {
        let attempted = self.batches_submitted.saturating_sub(self.batches_cancelled);
        attempted > 0 && self.batches_failed == attempted
    }
}
