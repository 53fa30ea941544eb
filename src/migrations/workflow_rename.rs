//! Renames `status_id` to `x_opencti_workflow_id` across every container,
//! executed by the store as one scripted update-by-query.

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::errors::MigrationError;
use crate::engine::migration::{Migration, MigrationContext, MigrationOutcome};
use crate::engine::runner::ScriptedMigration;
use crate::engine::store::{ConflictPolicy, Script, ScriptEffect, ScriptFn, UpdateByQuery};
use crate::engine::types::{Fields, ScanFilter};

pub const NAME: &str = "1651939301056-workflow_rename";

pub const FROM_FIELD: &str = "status_id";
pub const TO_FIELD: &str = "x_opencti_workflow_id";

pub const RENAME_FIELD_SCRIPT: &str = "ctx._source[params.to] = ctx._source.remove(params.from);";

pub struct WorkflowRename;

impl WorkflowRename {
    pub fn request() -> UpdateByQuery {
        UpdateByQuery {
            filter: ScanFilter::new().with_required_field(FROM_FIELD),
            script: Script::new(RENAME_FIELD_SCRIPT)
                .with_param("from", FROM_FIELD)
                .with_param("to", TO_FIELD),
            refresh: true,
            conflicts: ConflictPolicy::Proceed,
        }
    }
}

#[async_trait]
impl Migration for WorkflowRename {
    fn name(&self) -> &str {
        NAME
    }

    async fn up(&self, ctx: &MigrationContext) -> Result<MigrationOutcome, MigrationError> {
        let migration = ScriptedMigration::new(NAME, Arc::clone(&ctx.store), Self::request());
        migration.up().await.map(MigrationOutcome::Scripted)
    }
}

/// Native handler for [`RENAME_FIELD_SCRIPT`].
pub fn rename_field_script() -> ScriptFn {
    Arc::new(|fields: &mut Fields, params: &Fields| -> Result<ScriptEffect, String> {
        let from = string_param(params, "from")?;
        let to = string_param(params, "to")?;

        match fields.remove(from) {
            Some(value) => {
                fields.insert(to.to_string(), value);
                Ok(ScriptEffect::Updated)
            }
            None => Ok(ScriptEffect::Noop),
        }
    })
}

fn string_param<'a>(params: &'a Fields, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing string param '{name}'"))
}
