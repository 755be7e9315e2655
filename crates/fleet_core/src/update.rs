use crate::scheduler::{Completion, RefreshTrigger};
use crate::{Action, AppState, Effect, EntityName, Msg, SchedulerPhase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            state.scheduler_mut().start();
            state.mark_dirty();
            Vec::new()
        }
        Msg::Tick { elapsed } => {
            let before = state.scheduler().remaining().map(|d| d.as_secs());
            let trigger = state.scheduler_mut().tick(elapsed);
            let after = state.scheduler().remaining().map(|d| d.as_secs());
            if before != after {
                state.mark_dirty();
            }
            begin_refresh(&mut state, trigger)
        }
        Msg::RefreshClicked => {
            let trigger = state.scheduler_mut().request_refresh(false);
            state.mark_dirty();
            begin_refresh(&mut state, trigger)
        }
        Msg::AutoRefreshToggled(enabled) => {
            state.scheduler_mut().set_auto_refresh(enabled);
            state.mark_dirty();
            Vec::new()
        }
        Msg::VisibilityChanged { visible } => {
            state.scheduler_mut().set_visible(visible);
            state.mark_dirty();
            Vec::new()
        }
        Msg::FocusChanged { focused } => {
            state.scheduler_mut().set_focused(focused);
            state.mark_dirty();
            Vec::new()
        }
        Msg::RefreshProgress { cycle, progress } => {
            if state.scheduler().in_flight() == Some(cycle) {
                state.apply_progress(progress);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RefreshCompleted { cycle, result } => {
            match state.scheduler_mut().complete(cycle) {
                Completion::Stale => Vec::new(),
                Completion::Accepted { follow_up } => {
                    state.finish_refresh();
                    match result {
                        Ok(report) => state.apply_report(report),
                        Err(error) => state.apply_fleet_failure(error),
                    }
                    state.mark_dirty();
                    begin_refresh(&mut state, follow_up)
                }
            }
        }
        Msg::SelectionToggled { name } => {
            if state.toggle_selection(name) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectAllVisible => {
            state.select_all_visible();
            state.mark_dirty();
            Vec::new()
        }
        Msg::SelectionCleared => {
            if state.clear_selection() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SearchChanged(search) => {
            state.set_search(search);
            state.mark_dirty();
            Vec::new()
        }
        Msg::StateFilterChanged(filter) => {
            state.set_state_filter(filter);
            state.mark_dirty();
            Vec::new()
        }
        Msg::BulkActionRequested { action } => {
            let names = state.selected_names();
            request_action(&mut state, names, action)
        }
        Msg::EntityActionRequested { name, action } => {
            if state.is_listed(&name) {
                request_action(&mut state, vec![name], action)
            } else {
                Vec::new()
            }
        }
        Msg::ConfirmPending => {
            // A parked action waits until the running bulk action settles.
            if state.bulk_in_flight() {
                Vec::new()
            } else if let Some(pending) = state.take_pending() {
                state.mark_dirty();
                dispatch_action(&mut state, pending.names, pending.action)
            } else {
                Vec::new()
            }
        }
        Msg::CancelPending => {
            if state.take_pending().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::BulkCompleted { action, result } => {
            state.finish_bulk(action, result);
            state.mark_dirty();
            let trigger = state.scheduler_mut().request_refresh(true);
            begin_refresh(&mut state, trigger)
        }
        Msg::RetryEntityClicked { name } => {
            let retryable = state
                .entity_error(&name)
                .is_some_and(|error| error.retryable);
            if retryable && !state.is_retrying(&name) {
                let generation = state.begin_retry(name.clone());
                state.mark_dirty();
                vec![Effect::RefreshEntity { name, generation }]
            } else {
                Vec::new()
            }
        }
        Msg::EntityRefreshed {
            name,
            generation,
            result,
        } => {
            if state.apply_entity_result(name, generation, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn begin_refresh(state: &mut AppState, trigger: Option<RefreshTrigger>) -> Vec<Effect> {
    match trigger {
        Some(RefreshTrigger { cycle, silent }) => {
            debug_assert_eq!(state.scheduler().phase(), SchedulerPhase::Fetching);
            state.begin_refresh(silent);
            state.mark_dirty();
            vec![Effect::RefreshFleet { cycle, silent }]
        }
        None => Vec::new(),
    }
}

fn request_action(state: &mut AppState, names: Vec<EntityName>, action: Action) -> Vec<Effect> {
    if names.is_empty() || state.bulk_in_flight() {
        return Vec::new();
    }
    state.mark_dirty();
    if action.needs_confirmation() {
        state.park(action, names);
        Vec::new()
    } else {
        dispatch_action(state, names, action)
    }
}

fn dispatch_action(state: &mut AppState, names: Vec<EntityName>, action: Action) -> Vec<Effect> {
    state.begin_bulk(action);
    vec![Effect::ApplyAction { names, action }]
}
