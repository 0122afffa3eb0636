//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, initializes logging, discovers settings,
//! dispatches to a command and prints every error itself.

use anyhow::Result;
use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::logging::{init_tracing, sanitize};
use crate::{CliArgs, Config, EngineError, ExitCode};

/// Main CLI execution function.
///
/// Returns `Err(ExitCode)` after printing the error; main.rs only maps it
/// to the process exit status.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        region: cli.region.clone(),
        stack_prefix: cli.stack_prefix.clone(),
        verbose: Some(cli.verbose),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let result = match cli.command {
        Commands::Validate { descriptor } => {
            commands::execute_validate_command(descriptor.as_deref(), &config)
        }
        Commands::Plan { descriptor, json } => {
            commands::execute_plan_command(descriptor.as_deref(), json, cli.verbose, &config)
        }
        Commands::Capabilities { json } => commands::execute_capabilities_command(json),
        Commands::Config => commands::execute_config_command(&config),
    };

    match result {
        Ok(()) => Ok(()),
        Err(error) => Err(report_error(&error)),
    }
}

/// Print an error and pick the exit code for it.
fn report_error(error: &anyhow::Error) -> ExitCode {
    if let Some(engine_error) = error.downcast_ref::<EngineError>() {
        eprint!("{}", sanitize(&engine_error.display_for_user()));
        return engine_error.to_exit_code();
    }

    eprintln!("✗ Unexpected error: {}", sanitize(&format!("{error:#}")));
    eprintln!("\n  Run with --verbose for more detailed output");
    ExitCode::INTERNAL
}
