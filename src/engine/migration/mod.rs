pub mod journal;
pub mod migrator;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::engine::errors::MigrationError;
use crate::engine::runner::{MigrationOptions, MigrationReport};
use crate::engine::store::{DocumentStore, UpdateByQueryReport};

pub use journal::{AppliedMigration, MigrationJournal};
pub use migrator::{MigrationStatus, Migrator};

/// What a migration needs from its environment.
#[derive(Clone)]
pub struct MigrationContext {
    pub store: Arc<dyn DocumentStore>,
    pub options: MigrationOptions,
    pub cancel: CancellationToken,
}

impl MigrationContext {
    pub fn new(store: Arc<dyn DocumentStore>, options: MigrationOptions) -> Self {
        Self {
            store,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    Streamed(MigrationReport),
    Scripted(UpdateByQueryReport),
    Noop,
}

impl MigrationOutcome {
    /// A cancelled streaming run did not finish its work.
    pub fn is_complete(&self) -> bool {
        match self {
            MigrationOutcome::Streamed(report) => !report.cancelled,
            _ => true,
        }
    }
}

/// A named, ordered migration step. A step counts as done only once `up`
/// returns `Ok`.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Sort key and journal key, e.g. `1611671597858-standard_id`.
    fn name(&self) -> &str;

    async fn up(&self, ctx: &MigrationContext) -> Result<MigrationOutcome, MigrationError>;

    async fn down(&self, _ctx: &MigrationContext) -> Result<MigrationOutcome, MigrationError> {
        Ok(MigrationOutcome::Noop)
    }
}
