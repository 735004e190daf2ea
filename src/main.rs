//! jbak - Joplin multi-account backup
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use jbak::cli::{Cli, Commands};
use jbak::core::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&logging::LogOptions::resolve(
        cli.log_level.as_deref(),
        cli.json_output,
        cli.verbose,
    ));

    match run(cli).await {
        Ok(code) => code.into(),
        Err(e) => {
            tracing::error!(code = e.error_code(), category = %e.category(), "Fatal error: {e}");
            e.exit_code().into()
        }
    }
}

async fn run(cli: Cli) -> jbak::Result<jbak::ExitCode> {
    let config_path = cli.config.as_deref();

    match cli.command {
        // Default to a full backup run, which is what cron invokes
        None => jbak::cli::backup::execute(&jbak::cli::args::BackupArgs::default(), config_path).await,
        Some(Commands::Backup(args)) => jbak::cli::backup::execute(&args, config_path).await,
        Some(Commands::Ping(args)) => jbak::cli::ping::execute(&args, config_path).await,
        Some(Commands::Prune(args)) => jbak::cli::prune::execute(&args, config_path),
    }
}
