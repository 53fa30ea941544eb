use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::errors::DumpError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// Record of completed migrations, persisted as JSON.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MigrationJournal {
    #[serde(skip)]
    path: Option<PathBuf>,
    applied: Vec<AppliedMigration>,
}

impl MigrationJournal {
    /// A journal that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the journal at `path`; a missing file is an empty journal.
    pub fn load(path: &Path) -> Result<Self, DumpError> {
        let mut journal = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<MigrationJournal>(&raw)?
        } else {
            Self::default()
        };
        journal.path = Some(path.to_path_buf());
        debug!(
            target: "docshift::journal",
            path = %path.display(),
            applied = journal.applied.len(),
            "Loaded migration journal"
        );
        Ok(journal)
    }

    pub fn save(&self) -> Result<(), DumpError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn applied(&self) -> &[AppliedMigration] {
        &self.applied
    }

    pub fn get(&self, name: &str) -> Option<&AppliedMigration> {
        self.applied.iter().find(|m| m.name == name)
    }

    pub fn is_applied(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn record(&mut self, name: &str) {
        if !self.is_applied(name) {
            self.applied.push(AppliedMigration {
                name: name.to_string(),
                applied_at: Utc::now(),
            });
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.applied.len();
        self.applied.retain(|m| m.name != name);
        self.applied.len() != before
    }
}
