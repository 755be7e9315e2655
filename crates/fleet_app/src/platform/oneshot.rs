//! Non-interactive subcommands: one request or batch, printed, then exit.

use std::collections::{BTreeMap, BTreeSet};
use std::process::ExitCode;
use std::sync::Arc;

use console_logging::console_debug;
use fleet_core::{fleet_rows, Action, EntityName, Filters};
use fleet_engine::{
    apply_action, refresh_fleet, ApiClient, ApiError, BatchExecutor, ReqwestGateway,
};

use super::config::{Command, ConsoleConfig};
use super::ui::render;

const PLUGIN_CLASS_KEY: &str = "connector.class";

pub fn run_oneshot(config: &ConsoleConfig, command: Command) -> anyhow::Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let gateway = ReqwestGateway::new(&config.gateway_settings())?;
    let client = ApiClient::new(Arc::new(gateway), &config.base_url, config.timeouts)?;
    let cluster = config.cluster.as_str();

    let code = match command {
        Command::Watch => anyhow::bail!("`watch` is interactive and has no one-shot form"),
        Command::List => {
            let executor = BatchExecutor::new(config.concurrency)?;
            let result = runtime.block_on(refresh_fleet(&client, cluster, &executor, |progress| {
                console_debug!("fetched {}/{}", progress.completed, progress.total);
            }));
            match result {
                Ok(report) => {
                    let errors: BTreeMap<EntityName, _> = report
                        .failures
                        .iter()
                        .map(|failure| (failure.name.clone(), failure.error.clone()))
                        .collect();
                    let rows = fleet_rows(
                        &report.snapshots,
                        &errors,
                        &BTreeSet::new(),
                        &BTreeSet::new(),
                        &Filters::default(),
                    );
                    if rows.is_empty() {
                        println!("No connectors.");
                    } else {
                        print!("{}", render::render_table(&rows));
                    }
                    for failure in &report.failures {
                        println!("! {}: {}", failure.name, failure.error.message);
                    }
                    ExitCode::SUCCESS
                }
                Err(err) => api_failure(&err),
            }
        }
        Command::Act { action, names, yes } => {
            let action = Action::from(action);
            if action.needs_confirmation() && !yes {
                eprintln!("Refusing to {action} without --yes.");
                return Ok(ExitCode::from(2));
            }
            let names = unique(names);
            let executor = BatchExecutor::new(config.concurrency)?;
            let result =
                runtime.block_on(apply_action(&client, cluster, &names, action, &executor));
            print!("{}", render::render_bulk(action, &result));
            if result.failures.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Plugins { classes } => {
            match runtime.block_on(client.available_plugins(cluster, &classes)) {
                Ok(installed) => {
                    for class_name in &classes {
                        let mark = if installed.contains(class_name) {
                            "installed"
                        } else {
                            "missing"
                        };
                        println!("{class_name}: {mark}");
                    }
                    if classes.iter().all(|class_name| installed.contains(class_name)) {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(err) => api_failure(&err),
            }
        }
        Command::Validate { class, settings } => {
            let settings = connector_settings(&class, settings);
            match runtime.block_on(client.validate_config(cluster, &class, &settings)) {
                Ok(validation) => {
                    println!("{}: {} error(s)", validation.name, validation.error_count);
                    for (field, errors) in validation.field_errors() {
                        for error in errors {
                            println!("  {field}: {error}");
                        }
                    }
                    if validation.error_count == 0 {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(err) => api_failure(&err),
            }
        }
    };
    Ok(code)
}

fn api_failure(err: &ApiError) -> ExitCode {
    let categorized = err.categorized();
    eprint!("{}", render::render_error(&categorized));
    if categorized.message != err.user_message() {
        eprintln!("  server said: {}", err.user_message());
    }
    ExitCode::FAILURE
}

/// Keeps first occurrence order.
fn unique(names: Vec<String>) -> Vec<EntityName> {
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

fn connector_settings(class: &str, settings: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = settings.into_iter().collect();
    map.entry(PLUGIN_CLASS_KEY.to_string())
        .or_insert_with(|| class.to_string());
    map
}
