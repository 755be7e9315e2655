use std::sync::Once;
use std::time::Duration;

use fleet_core::{
    classify, update, AppState, BatchProgress, EntityFailure, EntitySnapshot, EntityState, Effect,
    FleetReport, Msg, RawFailure, SchedulerPhase, TaskCounts,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(console_logging::initialize_for_tests);
}

fn snapshot(name: &str, state: EntityState) -> EntitySnapshot {
    EntitySnapshot {
        name: name.to_string(),
        state,
        task_counts: TaskCounts {
            total: 1,
            running: u32::from(state == EntityState::Running),
            failed: u32::from(state == EntityState::Failed),
        },
        plugin: Some("io.example.SinkConnector".to_string()),
        topics: vec!["orders".to_string()],
        worker_id: Some("worker-1:8083".to_string()),
    }
}

fn tick(state: AppState) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::Tick {
            elapsed: Duration::from_secs(1),
        },
    )
}

fn started() -> AppState {
    let (state, _) = update(AppState::with_cadence(Duration::from_secs(10)), Msg::Started);
    state
}

#[test]
fn timer_fires_silent_refresh_after_cadence() {
    init_logging();
    let mut state = started();
    for _ in 0..9 {
        let (next, effects) = tick(state);
        assert!(effects.is_empty());
        state = next;
    }
    assert_eq!(state.view().scheduler.remaining_secs, Some(1));

    let (state, effects) = tick(state);
    assert_eq!(
        effects,
        vec![Effect::RefreshFleet {
            cycle: 1,
            silent: true
        }]
    );
    let view = state.view();
    assert_eq!(view.scheduler.phase, SchedulerPhase::Fetching);
    assert!(!view.loading);
}

#[test]
fn manual_refresh_shows_loading_and_is_single_flight() {
    init_logging();
    let state = started();
    let (state, effects) = update(state, Msg::RefreshClicked);
    assert_eq!(
        effects,
        vec![Effect::RefreshFleet {
            cycle: 1,
            silent: false
        }]
    );
    assert!(state.view().loading);

    // Second click and timer ticks while in flight do not start another cycle.
    let (state, effects) = update(state, Msg::RefreshClicked);
    assert!(effects.is_empty());
    assert!(state.view().scheduler.queued);
    let (state, effects) = tick(state);
    assert!(effects.is_empty());

    // Completion starts exactly one coalesced follow-up.
    let (state, effects) = update(
        state,
        Msg::RefreshCompleted {
            cycle: 1,
            result: Ok(FleetReport::default()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::RefreshFleet {
            cycle: 2,
            silent: false
        }]
    );
    assert!(!state.view().scheduler.queued);
}

#[test]
fn stale_completion_is_discarded() {
    init_logging();
    let state = started();
    let (state, _) = update(state, Msg::RefreshClicked);
    let before = state.view();

    let (state, effects) = update(
        state,
        Msg::RefreshCompleted {
            cycle: 7,
            result: Ok(FleetReport {
                snapshots: vec![snapshot("ghost", EntityState::Running)],
                failures: Vec::new(),
            }),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().rows, before.rows);
    assert_eq!(state.view().scheduler.phase, SchedulerPhase::Fetching);

    let (state, _) = update(
        state,
        Msg::RefreshProgress {
            cycle: 7,
            progress: BatchProgress {
                completed: 3,
                total: 4,
            },
        },
    );
    assert_eq!(state.view().progress, Some(BatchProgress::default()));
}

#[test]
fn completion_replaces_snapshot_and_keeps_per_entity_errors() {
    init_logging();
    let state = started();
    let (state, _) = update(state, Msg::RefreshClicked);
    let (state, _) = update(
        state,
        Msg::RefreshProgress {
            cycle: 1,
            progress: BatchProgress {
                completed: 1,
                total: 2,
            },
        },
    );
    assert_eq!(
        state.view().progress,
        Some(BatchProgress {
            completed: 1,
            total: 2
        })
    );

    let error = classify(&RawFailure::Response {
        status: 503,
        status_text: "Service Unavailable".to_string(),
    });
    let (state, _) = update(
        state,
        Msg::RefreshCompleted {
            cycle: 1,
            result: Ok(FleetReport {
                snapshots: vec![snapshot("beta", EntityState::Paused)],
                failures: vec![EntityFailure {
                    name: "alpha".to_string(),
                    error: error.clone(),
                }],
            }),
        },
    );

    let view = state.view();
    assert!(!view.loading);
    assert_eq!(view.progress, None);
    assert_eq!(view.total_entities, 2);
    assert_eq!(view.rows[0].name, "alpha");
    assert_eq!(view.rows[0].state, EntityState::Unknown);
    assert_eq!(view.rows[0].error, Some(error));
    assert!(view.rows[0].can_retry());
    assert_eq!(view.rows[1].name, "beta");
    assert_eq!(view.rows[1].state, EntityState::Paused);
    assert_eq!(view.scheduler.phase, SchedulerPhase::Counting);
    assert_eq!(view.scheduler.remaining_secs, Some(10));
}

#[test]
fn fleet_failure_sets_banner_and_keeps_previous_rows() {
    init_logging();
    let state = started();
    let (state, _) = update(state, Msg::RefreshClicked);
    let (state, _) = update(
        state,
        Msg::RefreshCompleted {
            cycle: 1,
            result: Ok(FleetReport {
                snapshots: vec![snapshot("alpha", EntityState::Running)],
                failures: Vec::new(),
            }),
        },
    );

    let (state, _) = update(state, Msg::RefreshClicked);
    let error = classify(&RawFailure::message("connect ECONNREFUSED 10.0.0.1:443"));
    let (state, effects) = update(
        state,
        Msg::RefreshCompleted {
            cycle: 2,
            result: Err(error.clone()),
        },
    );
    assert!(effects.is_empty());

    let view = state.view();
    assert_eq!(view.banner, Some(error));
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.scheduler.phase, SchedulerPhase::Counting);
}

#[test]
fn pause_during_fetch_is_honored_after_settling() {
    init_logging();
    let state = started();
    let (state, _) = update(state, Msg::RefreshClicked);
    let (state, _) = update(state, Msg::VisibilityChanged { visible: false });
    assert_eq!(state.view().scheduler.phase, SchedulerPhase::Fetching);

    let (state, _) = update(
        state,
        Msg::RefreshCompleted {
            cycle: 1,
            result: Ok(FleetReport::default()),
        },
    );
    assert_eq!(state.view().scheduler.phase, SchedulerPhase::Paused);

    let (state, effects) = tick(state);
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::VisibilityChanged { visible: true });
    assert_eq!(state.view().scheduler.phase, SchedulerPhase::Counting);
    assert_eq!(state.view().scheduler.remaining_secs, Some(10));
}

#[test]
fn focus_loss_pauses_and_regain_restarts_countdown() {
    init_logging();
    let mut state = started();
    for _ in 0..5 {
        state = tick(state).0;
    }
    let (state, _) = update(state, Msg::FocusChanged { focused: false });
    assert_eq!(state.view().scheduler.phase, SchedulerPhase::Paused);
    let (state, _) = update(state, Msg::FocusChanged { focused: true });
    assert_eq!(state.view().scheduler.remaining_secs, Some(10));

    let (state, _) = update(state, Msg::AutoRefreshToggled(false));
    let (state, _) = update(state, Msg::FocusChanged { focused: true });
    assert_eq!(state.view().scheduler.phase, SchedulerPhase::Paused);
    assert!(!state.view().scheduler.auto_refresh);
}
