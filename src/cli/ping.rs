//! Ping command implementation.

use std::path::Path;

use crate::cli::args::PingArgs;
use crate::core::health::HealthChecker;
use crate::error::{ExitCode, Result};
use crate::storage::config::{Overrides, Settings};

/// Execute the ping command.
///
/// Exits 0 when the server answers 200, 1 otherwise.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the HTTP client cannot be
/// built.
pub async fn execute(args: &PingArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let settings = Settings::resolve(config_path, &Overrides::from(args))?;

    let report = HealthChecker::new(settings.ping_timeout)?
        .ping(&settings.server_url)
        .await;
    report.log();

    Ok(if report.is_available() {
        ExitCode::Success
    } else {
        ExitCode::Failure
    })
}
