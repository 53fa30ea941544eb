use std::fmt;

/// Lifecycle of one migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationState {
    Pending,
    Scanning,
    Applying,
    Completed,
    Failed,
}

impl MigrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationState::Completed | MigrationState::Failed)
    }

    pub fn can_transition_to(&self, next: MigrationState) -> bool {
        use MigrationState::*;
        match (self, next) {
            (Pending, Scanning) | (Scanning, Applying) | (Applying, Completed) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::Pending => "pending",
            MigrationState::Scanning => "scanning",
            MigrationState::Applying => "applying",
            MigrationState::Completed => "completed",
            MigrationState::Failed => "failed",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
