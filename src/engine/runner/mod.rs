pub mod migration_runner;
pub mod options;
pub mod scripted;
pub mod state;

pub use migration_runner::{MigrationReport, MigrationRunner};
pub use options::MigrationOptions;
pub use scripted::ScriptedMigration;
pub use state::MigrationState;
