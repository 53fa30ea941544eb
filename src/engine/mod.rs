pub mod apply;
pub mod batch;
pub mod errors;
pub mod migration;
pub mod progress;
pub mod runner;
pub mod scan;
pub mod store;
pub mod transform;
pub mod types;

pub use apply::{ApplySummary, ConcurrentApplier, RetryPolicy};
pub use batch::BatchBuilder;
pub use migration::{Migration, MigrationContext, MigrationOutcome, Migrator};
pub use progress::{ProgressState, ProgressTracker};
pub use runner::{MigrationOptions, MigrationReport, MigrationRunner, MigrationState, ScriptedMigration};
pub use scan::DocumentScanner;
pub use store::{DocumentStore, MemoryStore};
pub use transform::{Transform, TransformStage};
pub use types::{Batch, DocumentRef, RawDocument, ScanFilter, WriteOperation};
