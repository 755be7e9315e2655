use std::collections::{BTreeMap, BTreeSet};

use crate::{
    Action, BatchProgress, BulkResult, BulkSummary, CategorizedError, EntityName, EntitySnapshot,
    EntityState, SchedulerPhase, TaskCounts,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    /// Case-insensitive substring over name and plugin.
    pub search: String,
    pub state: Option<EntityState>,
}

impl Filters {
    fn matches(&self, row: &EntityRowView) -> bool {
        if let Some(state) = self.state {
            if row.state != state {
                return false;
            }
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        row.name.to_lowercase().contains(&needle)
            || row
                .plugin
                .as_deref()
                .is_some_and(|plugin| plugin.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRowView {
    pub name: EntityName,
    pub state: EntityState,
    pub task_counts: TaskCounts,
    pub plugin: Option<String>,
    pub topics: Vec<String>,
    pub worker_id: Option<String>,
    pub selected: bool,
    /// Set when this connector's details could not be fetched.
    pub error: Option<CategorizedError>,
    pub retrying: bool,
}

impl EntityRowView {
    /// Retry is offered only for failures worth retrying.
    pub fn can_retry(&self) -> bool {
        !self.retrying && self.error.as_ref().is_some_and(|error| error.retryable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerView {
    pub phase: SchedulerPhase,
    pub remaining_secs: Option<u64>,
    pub auto_refresh: bool,
    pub queued: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActionView {
    pub action: Action,
    pub names: Vec<EntityName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReportView {
    pub action: Action,
    pub summary: BulkSummary,
    pub result: BulkResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub scheduler: SchedulerView,
    /// Foreground refresh in flight.
    pub loading: bool,
    pub progress: Option<BatchProgress>,
    /// Fleet-wide refresh failure.
    pub banner: Option<CategorizedError>,
    pub total_entities: usize,
    pub selected_count: usize,
    pub rows: Vec<EntityRowView>,
    pub filters: Filters,
    pub pending: Option<PendingActionView>,
    pub bulk_in_flight: Option<Action>,
    pub last_bulk: Option<BulkReportView>,
    pub completed_cycles: u64,
    pub dirty: bool,
}

/// Builds the filtered, name-ordered table from the current snapshot,
/// per-connector errors and selection.
pub fn fleet_rows(
    snapshots: &[EntitySnapshot],
    errors: &BTreeMap<EntityName, CategorizedError>,
    selection: &BTreeSet<EntityName>,
    retrying: &BTreeSet<EntityName>,
    filters: &Filters,
) -> Vec<EntityRowView> {
    let fetched = snapshots.iter().map(|snapshot| EntityRowView {
        name: snapshot.name.clone(),
        state: snapshot.state,
        task_counts: snapshot.task_counts,
        plugin: snapshot.plugin.clone(),
        topics: snapshot.topics.clone(),
        worker_id: snapshot.worker_id.clone(),
        selected: selection.contains(&snapshot.name),
        error: None,
        retrying: retrying.contains(&snapshot.name),
    });
    let failed = errors.iter().map(|(name, error)| EntityRowView {
        name: name.clone(),
        state: EntityState::Unknown,
        task_counts: TaskCounts::default(),
        plugin: None,
        topics: Vec::new(),
        worker_id: None,
        selected: selection.contains(name),
        error: Some(error.clone()),
        retrying: retrying.contains(name),
    });

    let mut rows: Vec<EntityRowView> = fetched
        .chain(failed)
        .filter(|row| filters.matches(row))
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// Names that are both selected and visible under the current filters.
pub fn selected_visible(rows: &[EntityRowView]) -> Vec<EntityName> {
    rows.iter()
        .filter(|row| row.selected)
        .map(|row| row.name.clone())
        .collect()
}
