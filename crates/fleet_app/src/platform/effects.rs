use std::sync::{mpsc, Arc};

use console_logging::{console_debug, console_info, console_warn};
use fleet_core::{Effect, Msg};
use fleet_engine::{EngineConfig, EngineError, EngineEvent, EngineHandle, EventSink};

use super::app::AppEvent;

/// Executes effects produced by `update` on the engine thread.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, events: mpsc::Sender<AppEvent>) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(config, Arc::new(MsgSink { events }))?;
        Ok(Self { engine })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RefreshFleet { cycle, silent } => {
                    console_debug!("RefreshFleet cycle={} silent={}", cycle, silent);
                    self.engine.refresh_fleet(cycle);
                }
                Effect::ApplyAction { names, action } => {
                    console_info!("ApplyAction {} on {} connector(s)", action, names.len());
                    self.engine.apply_action(names, action);
                }
                Effect::RefreshEntity { name, generation } => {
                    console_info!("RefreshEntity {} generation={}", name, generation);
                    self.engine.refresh_entity(name, generation);
                }
            }
        }
    }
}

struct MsgSink {
    events: mpsc::Sender<AppEvent>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(AppEvent::Msg(to_msg(event)));
    }
}

fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::RefreshProgress { cycle, progress } => {
            Msg::RefreshProgress { cycle, progress }
        }
        EngineEvent::RefreshCompleted { cycle, result } => {
            if let Err(error) = &result {
                console_warn!("Refresh cycle {} failed: {}", cycle, error);
            }
            Msg::RefreshCompleted { cycle, result }
        }
        EngineEvent::EntityRefreshed {
            name,
            generation,
            result,
        } => Msg::EntityRefreshed {
            name,
            generation,
            result,
        },
        EngineEvent::BulkCompleted { action, result } => Msg::BulkCompleted { action, result },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{Action, BatchProgress, BulkResult, CategorizedError, ErrorKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn engine_events_map_one_to_one() {
        assert_eq!(
            to_msg(EngineEvent::RefreshProgress {
                cycle: 3,
                progress: BatchProgress::start(4),
            }),
            Msg::RefreshProgress {
                cycle: 3,
                progress: BatchProgress::start(4),
            }
        );

        let error = CategorizedError::new(ErrorKind::Timeout, "Request timed out", "aborted");
        assert_eq!(
            to_msg(EngineEvent::EntityRefreshed {
                name: "orders".to_string(),
                generation: 2,
                result: Err(error.clone()),
            }),
            Msg::EntityRefreshed {
                name: "orders".to_string(),
                generation: 2,
                result: Err(error),
            }
        );

        assert_eq!(
            to_msg(EngineEvent::BulkCompleted {
                action: Action::Restart,
                result: BulkResult::default(),
            }),
            Msg::BulkCompleted {
                action: Action::Restart,
                result: BulkResult::default(),
            }
        );
    }

    #[test]
    fn sink_forwards_into_app_channel() {
        let (tx, rx) = mpsc::channel();
        let sink = MsgSink { events: tx };
        sink.emit(EngineEvent::RefreshCompleted {
            cycle: 1,
            result: Ok(Default::default()),
        });
        match rx.try_recv() {
            Ok(AppEvent::Msg(Msg::RefreshCompleted { cycle: 1, result: Ok(report) })) => {
                assert!(report.snapshots.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
