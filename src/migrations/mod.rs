pub mod standard_id;
pub mod workflow_rename;

use std::sync::Arc;

use crate::engine::migration::Migrator;
use crate::engine::store::MemoryStore;

pub use standard_id::StandardIdRewrite;
pub use workflow_rename::WorkflowRename;

/// Registers every built-in migration.
pub fn register_all(migrator: &mut Migrator) {
    migrator.register(Arc::new(StandardIdRewrite));
    migrator.register(Arc::new(WorkflowRename));
}

/// Installs the native handlers for the scripts built-in migrations send.
pub fn register_scripts(store: &MemoryStore) {
    store.register_script(
        workflow_rename::RENAME_FIELD_SCRIPT,
        workflow_rename::rename_field_script(),
    );
}
