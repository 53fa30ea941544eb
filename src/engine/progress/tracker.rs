use parking_lot::Mutex;
use tracing::info;

const LOG_TARGET: &str = "docshift::progress";

/// Counters for one migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub total_scanned: u64,
    pub total_submitted: u64,
    pub total_applied: u64,
    pub total_failed: u64,
    pub transform_failed: u64,
}

impl ProgressState {
    /// Operations whose bulk request has resolved, either way.
    pub fn processed(&self) -> u64 {
        self.total_applied + self.total_failed
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: ProgressState,
    last_emitted: u64,
}

/// Shared progress counters behind a single lock, with a status line
/// emitted every `stride` processed operations (0 = on every update).
#[derive(Debug)]
pub struct ProgressTracker {
    label: String,
    stride: u64,
    inner: Mutex<Inner>,
}

impl ProgressTracker {
    pub fn new(label: impl Into<String>, stride: u64) -> Self {
        Self {
            label: label.into(),
            stride,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn record_scanned(&self, documents: u64) {
        self.inner.lock().state.total_scanned += documents;
    }

    pub fn record_transform_failure(&self) {
        self.inner.lock().state.transform_failed += 1;
    }

    pub fn record_submitted(&self, operations: u64) {
        self.inner.lock().state.total_submitted += operations;
    }

    /// Records a resolved batch and emits a status line when due.
    pub fn record(&self, applied: u64, failed: u64) {
        let due = {
            let mut inner = self.inner.lock();
            inner.state.total_applied += applied;
            inner.state.total_failed += failed;
            let processed = inner.state.processed();
            if self.stride == 0 || processed - inner.last_emitted >= self.stride {
                inner.last_emitted = processed;
                Some(inner.state)
            } else {
                None
            }
        };

        if let Some(state) = due {
            info!(
                target: LOG_TARGET,
                applied = state.total_applied,
                failed = state.total_failed,
                "[MIGRATION] {}: {}",
                self.label,
                status_line(&state)
            );
        }
    }

    pub fn snapshot(&self) -> ProgressState {
        self.inner.lock().state
    }
}

/// `<applied> / <submitted>`.
///
/// The denominator counts operations handed to the applier so far, not the
/// run's final total. It grows while scanning continues, so mid-run lines
/// understate how much work remains.
pub fn status_line(state: &ProgressState) -> String {
    format!("{} / {}", state.total_applied, state.total_submitted)
}
