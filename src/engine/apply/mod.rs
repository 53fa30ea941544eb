pub mod applier;
pub mod retry;
pub mod summary;

pub use applier::ConcurrentApplier;
pub use retry::RetryPolicy;
pub use summary::{ApplySummary, BatchFailure, BatchOutcome, OperationFailure};
