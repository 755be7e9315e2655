use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use console_logging::{console_debug, console_info, console_warn};
use fleet_core::{update, AppState, AppViewModel, Msg};

use super::config::ConsoleConfig;
use super::effects::EffectRunner;
use super::ui::commands::{self, Input, HELP};
use super::ui::render::{self, RenderContext};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub enum AppEvent {
    Msg(Msg),
    Line(String),
    InputClosed,
}

/// Runs the interactive console until the operator quits or stdin closes.
pub fn run_app(config: &ConsoleConfig) -> anyhow::Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(config.engine_config(), event_tx.clone())?;
    console_info!(
        "Watching cluster {} at {} every {}s",
        config.cluster,
        config.base_url,
        config.cadence.as_secs()
    );

    spawn_ticker(event_tx.clone());
    spawn_stdin_reader(event_tx.clone());
    drop(event_tx);

    let mut console = Console::new(config, runner);
    console.dispatch(Msg::Started);
    console.dispatch(Msg::RefreshClicked);

    for event in event_rx {
        match event {
            AppEvent::Msg(msg) => console.dispatch(msg),
            AppEvent::Line(line) => match commands::parse(&line) {
                Ok(Input::Msgs(msgs)) => {
                    for msg in msgs {
                        console.dispatch(msg);
                    }
                    console.redraw();
                }
                Ok(Input::Help) => println!("{HELP}\n"),
                Ok(Input::Quit) => break,
                Err(err) => println!("{err}"),
            },
            AppEvent::InputClosed => break,
        }
    }
    console_info!("Console closed");
    Ok(())
}

fn spawn_ticker(events: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let mut last = Instant::now();
        loop {
            thread::sleep(TICK_INTERVAL);
            let now = Instant::now();
            let elapsed = now.duration_since(last);
            last = now;
            if events.send(AppEvent::Msg(Msg::Tick { elapsed })).is_err() {
                break;
            }
        }
    });
}

fn spawn_stdin_reader(events: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if events.send(AppEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    console_warn!("stdin read failed: {}", err);
                    break;
                }
            }
        }
        let _ = events.send(AppEvent::InputClosed);
    });
}

struct Console<'a> {
    config: &'a ConsoleConfig,
    runner: EffectRunner,
    state: AppState,
    last_frame: Option<AppViewModel>,
    last_refreshed: Option<chrono::DateTime<Local>>,
}

impl<'a> Console<'a> {
    fn new(config: &'a ConsoleConfig, runner: EffectRunner) -> Self {
        Self {
            config,
            runner,
            state: AppState::with_cadence(config.cadence),
            last_frame: None,
            last_refreshed: None,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        if let Msg::RefreshCompleted { cycle, .. } = &msg {
            if self.state.scheduler().in_flight() != Some(*cycle) {
                console_debug!("Discarding stale result of refresh cycle {}", cycle);
            }
        }
        let completed_before = self.state.completed_cycles();
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.run(effects);

        let was_dirty = state.consume_dirty();
        self.state = state;
        if !was_dirty {
            return;
        }
        if self.state.completed_cycles() != completed_before {
            self.last_refreshed = Some(Local::now());
        }
        let view = self.state.view();
        if render::needs_redraw(self.last_frame.as_ref(), &view) {
            self.draw(view);
        }
    }

    /// Redraws after operator input so the prompt reappears.
    fn redraw(&mut self) {
        self.draw(self.state.view());
    }

    fn draw(&mut self, view: AppViewModel) {
        let context = RenderContext {
            cluster: &self.config.cluster,
            last_refreshed: self.last_refreshed,
        };
        render::print_frame(&view, &context);
        let _ = io::Write::flush(&mut io::stdout());
        self.last_frame = Some(view);
    }
}
