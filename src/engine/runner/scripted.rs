use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::engine::errors::MigrationError;
use crate::engine::store::{DocumentStore, UpdateByQuery, UpdateByQueryReport};

const LOG_TARGET: &str = "docshift::migration";

/// A migration the store executes itself as one scripted update-by-query.
/// No client-side batching or concurrency control is involved.
pub struct ScriptedMigration {
    name: String,
    store: Arc<dyn DocumentStore>,
    request: UpdateByQuery,
}

impl ScriptedMigration {
    pub fn new(name: impl Into<String>, store: Arc<dyn DocumentStore>, request: UpdateByQuery) -> Self {
        Self {
            name: name.into(),
            store,
            request,
        }
    }

    pub fn request(&self) -> &UpdateByQuery {
        &self.request
    }

    pub async fn up(&self) -> Result<UpdateByQueryReport, MigrationError> {
        let started = Instant::now();
        info!(target: LOG_TARGET, "[MIGRATION] Starting {}", self.name);

        let report = self
            .store
            .update_by_query(&self.request)
            .await
            .map_err(|e| {
                error!(target: LOG_TARGET, "[MIGRATION] {} failed: {}", self.name, e);
                MigrationError::Database(e)
            })?;

        info!(
            target: LOG_TARGET,
            total = report.total,
            updated = report.updated,
            noops = report.noops,
            "[MIGRATION] {} finished in {} ms",
            self.name,
            started.elapsed().as_millis()
        );
        Ok(report)
    }

    /// One-way, like the streaming runner.
    pub async fn down(&self) -> Result<(), MigrationError> {
        info!(target: LOG_TARGET, "[MIGRATION] {} down: nothing to revert", self.name);
        Ok(())
    }
}
