use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::view_model::{
    self, AppViewModel, BulkReportView, Filters, PendingActionView, SchedulerView,
};
use crate::{
    Action, BatchProgress, BulkResult, CategorizedError, EntityName, EntitySnapshot, EntityState,
    FleetReport, RefreshScheduler,
};

/// An action parked until the operator confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingAction {
    pub(crate) action: Action,
    pub(crate) names: Vec<EntityName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BulkReport {
    pub(crate) action: Action,
    pub(crate) result: BulkResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    scheduler: RefreshScheduler,
    snapshots: Vec<EntitySnapshot>,
    entity_errors: BTreeMap<EntityName, CategorizedError>,
    selection: BTreeSet<EntityName>,
    filters: Filters,
    banner: Option<CategorizedError>,
    loading: bool,
    progress: Option<BatchProgress>,
    pending: Option<PendingAction>,
    bulk_in_flight: Option<Action>,
    last_bulk: Option<BulkReport>,
    /// Refetches in flight, keyed by the generation they were issued under.
    retrying: BTreeMap<EntityName, u64>,
    completed_cycles: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cadence(cadence: Duration) -> Self {
        Self {
            scheduler: RefreshScheduler::new(cadence),
            ..Self::default()
        }
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut RefreshScheduler {
        &mut self.scheduler
    }

    pub fn selection(&self) -> &BTreeSet<EntityName> {
        &self.selection
    }

    /// Refresh cycles whose result was accepted, successful or not.
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    pub fn view(&self) -> AppViewModel {
        let rows = view_model::fleet_rows(
            &self.snapshots,
            &self.entity_errors,
            &self.selection,
            &self.retrying_names(),
            &self.filters,
        );
        AppViewModel {
            scheduler: SchedulerView {
                phase: self.scheduler.phase(),
                remaining_secs: self.scheduler.remaining().map(|d| d.as_secs()),
                auto_refresh: self.scheduler.auto_refresh(),
                queued: self.scheduler.has_queued_refresh(),
            },
            loading: self.loading,
            progress: self.progress,
            banner: self.banner.clone(),
            total_entities: self.snapshots.len() + self.entity_errors.len(),
            selected_count: self.selection.len(),
            rows,
            filters: self.filters.clone(),
            pending: self.pending.as_ref().map(|pending| PendingActionView {
                action: pending.action,
                names: pending.names.clone(),
            }),
            bulk_in_flight: self.bulk_in_flight,
            last_bulk: self.last_bulk.as_ref().map(|report| BulkReportView {
                action: report.action,
                summary: report.result.summary(),
                result: report.result.clone(),
            }),
            completed_cycles: self.completed_cycles,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_listed(&self, name: &str) -> bool {
        self.entity_errors.contains_key(name)
            || self.snapshots.iter().any(|snapshot| snapshot.name == name)
    }

    pub(crate) fn begin_refresh(&mut self, silent: bool) {
        if !silent {
            self.loading = true;
        }
        self.progress = Some(BatchProgress::default());
    }

    pub(crate) fn apply_progress(&mut self, progress: BatchProgress) {
        self.progress = Some(progress);
    }

    pub(crate) fn finish_refresh(&mut self) {
        self.loading = false;
        self.progress = None;
        self.completed_cycles += 1;
    }

    /// Swaps in a fully assembled report and prunes the selection.
    pub(crate) fn apply_report(&mut self, report: FleetReport) {
        let present: BTreeSet<&str> = report.names().collect();
        self.selection.retain(|name| present.contains(name.as_str()));
        // The report is newer than any refetch still in flight.
        self.retrying.clear();
        self.entity_errors = report
            .failures
            .into_iter()
            .map(|failure| (failure.name, failure.error))
            .collect();
        self.snapshots = report.snapshots;
        self.banner = None;
    }

    pub(crate) fn apply_fleet_failure(&mut self, error: CategorizedError) {
        self.banner = Some(error);
    }

    pub(crate) fn toggle_selection(&mut self, name: EntityName) -> bool {
        if !self.is_listed(&name) {
            return false;
        }
        if !self.selection.remove(&name) {
            self.selection.insert(name);
        }
        true
    }

    pub(crate) fn select_all_visible(&mut self) {
        let visible: Vec<EntityName> = self.view_rows_names();
        self.selection.extend(visible);
    }

    fn view_rows_names(&self) -> Vec<EntityName> {
        view_model::fleet_rows(
            &self.snapshots,
            &self.entity_errors,
            &self.selection,
            &self.retrying_names(),
            &self.filters,
        )
        .into_iter()
        .map(|row| row.name)
        .collect()
    }

    pub(crate) fn clear_selection(&mut self) -> bool {
        let had_any = !self.selection.is_empty();
        self.selection.clear();
        had_any
    }

    pub(crate) fn set_search(&mut self, search: String) {
        self.filters.search = search;
    }

    pub(crate) fn set_state_filter(&mut self, state: Option<EntityState>) {
        self.filters.state = state;
    }

    pub(crate) fn selected_names(&self) -> Vec<EntityName> {
        self.selection.iter().cloned().collect()
    }

    pub(crate) fn bulk_in_flight(&self) -> bool {
        self.bulk_in_flight.is_some()
    }

    pub(crate) fn park(&mut self, action: Action, names: Vec<EntityName>) {
        self.pending = Some(PendingAction { action, names });
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    pub(crate) fn begin_bulk(&mut self, action: Action) {
        self.bulk_in_flight = Some(action);
        self.last_bulk = None;
    }

    pub(crate) fn finish_bulk(&mut self, action: Action, result: BulkResult) {
        self.bulk_in_flight = None;
        self.last_bulk = Some(BulkReport { action, result });
    }

    pub(crate) fn entity_error(&self, name: &str) -> Option<&CategorizedError> {
        self.entity_errors.get(name)
    }

    pub(crate) fn is_retrying(&self, name: &str) -> bool {
        self.retrying.contains_key(name)
    }

    fn retrying_names(&self) -> BTreeSet<EntityName> {
        self.retrying.keys().cloned().collect()
    }

    /// Registers a refetch and returns the generation its result must carry.
    pub(crate) fn begin_retry(&mut self, name: EntityName) -> u64 {
        let generation = self.completed_cycles;
        self.retrying.insert(name, generation);
        generation
    }

    /// Folds a single refetch into a new snapshot list. Results from a
    /// refetch that a later fleet report superseded are dropped.
    pub(crate) fn apply_entity_result(
        &mut self,
        name: EntityName,
        generation: u64,
        result: Result<EntitySnapshot, CategorizedError>,
    ) -> bool {
        if self.retrying.get(&name) != Some(&generation) {
            return false;
        }
        self.retrying.remove(&name);
        if !self.is_listed(&name) {
            return false;
        }
        match result {
            Ok(snapshot) => {
                self.entity_errors.remove(&name);
                let mut replaced = false;
                let mut next: Vec<EntitySnapshot> = self
                    .snapshots
                    .iter()
                    .map(|existing| {
                        if existing.name == name {
                            replaced = true;
                            snapshot.clone()
                        } else {
                            existing.clone()
                        }
                    })
                    .collect();
                if !replaced {
                    next.push(snapshot);
                }
                self.snapshots = next;
            }
            Err(error) => {
                self.snapshots = self
                    .snapshots
                    .iter()
                    .filter(|existing| existing.name != name)
                    .cloned()
                    .collect();
                self.entity_errors.insert(name, error);
            }
        }
        true
    }
}
