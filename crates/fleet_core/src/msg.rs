use std::time::Duration;

use crate::{
    Action, BatchProgress, BulkResult, CategorizedError, CycleId, EntityName, EntitySnapshot,
    EntityState, FleetReport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The console is up; arm the refresh countdown.
    Started,
    /// Timer tick carrying the time since the previous tick.
    Tick { elapsed: Duration },
    /// Operator clicked Refresh.
    RefreshClicked,
    /// Operator switched auto refresh on or off.
    AutoRefreshToggled(bool),
    /// The page became visible or hidden.
    VisibilityChanged { visible: bool },
    /// The page gained or lost focus.
    FocusChanged { focused: bool },
    /// Engine progress for a refresh cycle.
    RefreshProgress {
        cycle: CycleId,
        progress: BatchProgress,
    },
    /// Engine completion for a refresh cycle.
    RefreshCompleted {
        cycle: CycleId,
        result: Result<FleetReport, CategorizedError>,
    },
    SelectionToggled { name: EntityName },
    /// Select every row that passes the current filters.
    SelectAllVisible,
    SelectionCleared,
    SearchChanged(String),
    StateFilterChanged(Option<EntityState>),
    /// Apply `action` to the current selection.
    BulkActionRequested { action: Action },
    /// Apply `action` to one connector.
    EntityActionRequested { name: EntityName, action: Action },
    /// Operator confirmed the parked (destructive) action.
    ConfirmPending,
    /// Operator backed out of the parked action.
    CancelPending,
    /// Engine completion for a bulk action.
    BulkCompleted { action: Action, result: BulkResult },
    /// Operator asked to retry a connector whose fetch failed.
    RetryEntityClicked { name: EntityName },
    /// Engine completion for a single-connector refetch.
    EntityRefreshed {
        name: EntityName,
        generation: u64,
        result: Result<EntitySnapshot, CategorizedError>,
    },
    NoOp,
}
