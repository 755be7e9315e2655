use std::fmt;

use crate::CategorizedError;

pub type EntityName = String;

/// Identifies one remote connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    pub cluster_id: String,
    pub name: EntityName,
}

impl EntityRef {
    pub fn new(cluster_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum EntityState {
    Running,
    Paused,
    Failed,
    #[default]
    Unknown,
}

impl EntityState {
    /// Maps a connector state string as reported by the API.
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => EntityState::Running,
            "PAUSED" => EntityState::Paused,
            "FAILED" => EntityState::Failed,
            _ => EntityState::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityState::Running => "RUNNING",
            EntityState::Paused => "PAUSED",
            EntityState::Failed => "FAILED",
            EntityState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: u32,
    pub running: u32,
    pub failed: u32,
}

/// Per-refresh view of one connector. Rebuilt on every cycle, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub name: EntityName,
    pub state: EntityState,
    pub task_counts: TaskCounts,
    pub plugin: Option<String>,
    pub topics: Vec<String>,
    pub worker_id: Option<String>,
}

/// A connector whose detail fetch failed during a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFailure {
    pub name: EntityName,
    pub error: CategorizedError,
}

/// Everything one successful refresh cycle produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FleetReport {
    pub snapshots: Vec<EntitySnapshot>,
    pub failures: Vec<EntityFailure>,
}

impl FleetReport {
    /// Names of every listed connector, fetched or not.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.snapshots
            .iter()
            .map(|snapshot| snapshot.name.as_str())
            .chain(self.failures.iter().map(|failure| failure.name.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Pause,
    Resume,
    Restart,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Pause, Action::Resume, Action::Restart, Action::Delete];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pause" => Some(Action::Pause),
            "resume" => Some(Action::Resume),
            "restart" => Some(Action::Restart),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Restart => "restart",
            Action::Delete => "delete",
        }
    }

    pub fn needs_confirmation(self) -> bool {
        self == Action::Delete
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub name: EntityName,
    pub error: String,
}

/// Outcome of applying one action to many connectors.
///
/// Every attempted name lands in exactly one of the two lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkResult {
    pub successes: Vec<EntityName>,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkSummary {
    AllSucceeded,
    PartialSuccess,
    AllFailed,
}

impl BulkResult {
    pub fn attempted(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn summary(&self) -> BulkSummary {
        match (self.successes.is_empty(), self.failures.is_empty()) {
            (_, true) => BulkSummary::AllSucceeded,
            (true, false) => BulkSummary::AllFailed,
            (false, false) => BulkSummary::PartialSuccess,
        }
    }
}

/// `{completed, total}` for the batch currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn start(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }
}
