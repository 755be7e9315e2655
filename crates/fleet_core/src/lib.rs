//! Fleet console core: pure state machine, error classification and view-model helpers.
mod classify;
mod effect;
mod entity;
mod msg;
mod scheduler;
mod state;
mod update;
mod view_model;

pub use classify::{classify, CategorizedError, ErrorKind, RawFailure};
pub use effect::Effect;
pub use entity::{
    Action, BatchProgress, BulkFailure, BulkResult, BulkSummary, EntityFailure, EntityName,
    EntityRef, EntitySnapshot, EntityState, FleetReport, TaskCounts,
};
pub use msg::Msg;
pub use scheduler::{
    Completion, CycleId, RefreshScheduler, RefreshTrigger, SchedulerPhase, DEFAULT_CADENCE,
};
pub use state::AppState;
pub use update::update;
pub use view_model::{
    fleet_rows, selected_visible, AppViewModel, BulkReportView, EntityRowView, Filters,
    PendingActionView, SchedulerView,
};
