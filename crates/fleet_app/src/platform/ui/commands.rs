//! Operator command line parsing for the interactive console.

use fleet_core::{Action, EntityState, Msg};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Msgs(Vec<Msg>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}` (type `help`)")]
    Unknown(String),
    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("invalid value `{value}` for `{command}`")]
    InvalidValue {
        command: &'static str,
        value: String,
    },
}

pub const HELP: &str = "\
commands:
  r, refresh              refresh now
  auto on|off             toggle automatic refresh
  hide | show             simulate the console being hidden or shown
  blur | focus            simulate losing or regaining focus
  sel <name>...           toggle selection of connectors
  all | none              select every visible connector / clear selection
  find [text]             filter by name or plugin (no text clears)
  state <state>|any       filter by running, paused, failed or unknown
  <action> [name]         pause, resume, restart or delete the selection or one connector
  yes | no                confirm or cancel a pending delete
  retry <name>            refetch one connector after a retryable failure
  help | quit";

pub fn parse(line: &str) -> Result<Input, CommandError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Input::Msgs(Vec::new()));
    };
    let args: Vec<&str> = words.collect();

    let msgs = match command.to_lowercase().as_str() {
        "help" | "?" => return Ok(Input::Help),
        "q" | "quit" | "exit" => return Ok(Input::Quit),
        "r" | "refresh" => vec![Msg::RefreshClicked],
        "auto" => match args.first().map(|arg| arg.to_lowercase()).as_deref() {
            Some("on") => vec![Msg::AutoRefreshToggled(true)],
            Some("off") => vec![Msg::AutoRefreshToggled(false)],
            Some(other) => {
                return Err(CommandError::InvalidValue {
                    command: "auto",
                    value: other.to_string(),
                })
            }
            None => {
                return Err(CommandError::MissingArgument {
                    command: "auto",
                    what: "on or off",
                })
            }
        },
        "hide" => vec![Msg::VisibilityChanged { visible: false }],
        "show" => vec![Msg::VisibilityChanged { visible: true }],
        "blur" => vec![Msg::FocusChanged { focused: false }],
        "focus" => vec![Msg::FocusChanged { focused: true }],
        "sel" | "select" => {
            if args.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "sel",
                    what: "one or more connector names",
                });
            }
            args.iter()
                .map(|name| Msg::SelectionToggled {
                    name: (*name).to_string(),
                })
                .collect()
        }
        "all" => vec![Msg::SelectAllVisible],
        "none" | "clear" => vec![Msg::SelectionCleared],
        "find" | "search" => vec![Msg::SearchChanged(args.join(" "))],
        "state" => {
            let Some(raw) = args.first() else {
                return Err(CommandError::MissingArgument {
                    command: "state",
                    what: "a state or `any`",
                });
            };
            vec![Msg::StateFilterChanged(parse_state(raw)?)]
        }
        "yes" | "confirm" => vec![Msg::ConfirmPending],
        "no" | "cancel" => vec![Msg::CancelPending],
        "retry" => match args.first() {
            Some(name) => vec![Msg::RetryEntityClicked {
                name: (*name).to_string(),
            }],
            None => {
                return Err(CommandError::MissingArgument {
                    command: "retry",
                    what: "a connector name",
                })
            }
        },
        other => match Action::parse(other) {
            Some(action) => match args.first() {
                Some(name) => vec![Msg::EntityActionRequested {
                    name: (*name).to_string(),
                    action,
                }],
                None => vec![Msg::BulkActionRequested { action }],
            },
            None => return Err(CommandError::Unknown(command.to_string())),
        },
    };
    Ok(Input::Msgs(msgs))
}

fn parse_state(raw: &str) -> Result<Option<EntityState>, CommandError> {
    match raw.to_lowercase().as_str() {
        "any" | "all" => Ok(None),
        "running" => Ok(Some(EntityState::Running)),
        "paused" => Ok(Some(EntityState::Paused)),
        "failed" => Ok(Some(EntityState::Failed)),
        "unknown" => Ok(Some(EntityState::Unknown)),
        _ => Err(CommandError::InvalidValue {
            command: "state",
            value: raw.to_string(),
        }),
    }
}
