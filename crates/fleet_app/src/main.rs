mod platform;

use std::process::ExitCode;

use clap::Parser;

use platform::config::{Cli, Command, ConsoleConfig, LogTarget};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let command = cli.command.clone().unwrap_or(Command::Watch);
    // The watch screen is redrawn in place, so its logs default to a file.
    let log_target = cli.log.unwrap_or(match command {
        Command::Watch => LogTarget::File,
        _ => LogTarget::Terminal,
    });
    platform::logging::initialize(log_target, cli.verbose);

    let config = ConsoleConfig::resolve(&cli)?;
    match command {
        Command::Watch => {
            platform::run_app(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        other => platform::run_oneshot(&config, other),
    }
}
