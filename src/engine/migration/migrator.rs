use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::journal::MigrationJournal;
use super::{Migration, MigrationContext, MigrationOutcome};
use crate::engine::errors::MigrationError;

const LOG_TARGET: &str = "docshift::migrator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Runs registered migrations in name order and journals the ones that
/// complete, so a rerun only picks up what is still pending.
pub struct Migrator {
    migrations: Vec<Arc<dyn Migration>>,
    journal: MigrationJournal,
    ctx: MigrationContext,
}

impl Migrator {
    pub fn new(ctx: MigrationContext, journal: MigrationJournal) -> Self {
        Self {
            migrations: Vec::new(),
            journal,
            ctx,
        }
    }

    pub fn register(&mut self, migration: Arc<dyn Migration>) {
        self.migrations.push(migration);
        self.migrations.sort_by(|a, b| a.name().cmp(b.name()));
    }

    pub fn journal(&self) -> &MigrationJournal {
        &self.journal
    }

    pub fn status(&self) -> Vec<MigrationStatus> {
        self.migrations
            .iter()
            .map(|m| MigrationStatus {
                name: m.name().to_string(),
                applied_at: self.journal.get(m.name()).map(|a| a.applied_at),
            })
            .collect()
    }

    pub fn pending(&self) -> Vec<String> {
        self.migrations
            .iter()
            .filter(|m| !self.journal.is_applied(m.name()))
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Runs every pending migration. Stops at the first error, or at a
    /// cancelled run, which is left unjournaled.
    pub async fn up_pending(&mut self) -> Result<Vec<(String, MigrationOutcome)>, MigrationError> {
        let mut completed = Vec::new();
        let pending: Vec<Arc<dyn Migration>> = self
            .migrations
            .iter()
            .filter(|m| !self.journal.is_applied(m.name()))
            .cloned()
            .collect();

        if pending.is_empty() {
            info!(target: LOG_TARGET, "[MIGRATION] No pending migrations");
        }

        for migration in pending {
            if self.ctx.cancel.is_cancelled() {
                warn!(target: LOG_TARGET, "Cancelled before {}", migration.name());
                break;
            }

            let outcome = migration.up(&self.ctx).await?;
            if !outcome.is_complete() {
                warn!(
                    target: LOG_TARGET,
                    migration = migration.name(),
                    "Migration interrupted, not journaled"
                );
                completed.push((migration.name().to_string(), outcome));
                break;
            }

            self.journal.record(migration.name());
            self.journal
                .save()
                .map_err(|e| MigrationError::Journal(e.to_string()))?;
            completed.push((migration.name().to_string(), outcome));
        }

        Ok(completed)
    }

    /// Runs `down` for `name` and drops it from the journal.
    pub async fn down(&mut self, name: &str) -> Result<MigrationOutcome, MigrationError> {
        let migration = self
            .migrations
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .ok_or_else(|| MigrationError::UnknownMigration(name.to_string()))?;

        let outcome = migration.down(&self.ctx).await?;
        if self.journal.remove(name) {
            self.journal
                .save()
                .map_err(|e| MigrationError::Journal(e.to_string()))?;
        }
        Ok(outcome)
    }
}
