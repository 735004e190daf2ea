//! Backup command implementation.

use std::path::Path;

use crate::cli::args::BackupArgs;
use crate::core::health::HealthChecker;
use crate::core::joplin::JoplinCli;
use crate::core::pipeline::{BackupOptions, BackupRunner};
use crate::error::{BackupError, ExitCode, Result};
use crate::storage::accounts::load_accounts;
use crate::storage::config::{Overrides, Settings};

/// Execute the backup command.
///
/// # Errors
///
/// Returns an error only for problems that stop the run before any account
/// is processed: invalid settings, an unusable accounts file, or a failed
/// server check when one is required. Per-account failures are reported
/// through the returned exit code.
pub async fn execute(args: &BackupArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let settings = Settings::resolve(config_path, &Overrides::from(args))?;
    tracing::debug!(?settings, "Starting backup");

    let entries = load_accounts(&settings.accounts_file)?;
    if entries.is_empty() {
        tracing::warn!("No accounts configured, nothing to back up");
        return Ok(ExitCode::Success);
    }

    if settings.require_server {
        let report = HealthChecker::new(settings.ping_timeout)?
            .ping(&settings.server_url)
            .await;
        report.log();
        if !report.is_available() {
            let reason = report.error.unwrap_or_else(|| {
                format!("HTTP {}", report.status.map_or_else(String::new, |s| s.to_string()))
            });
            return Err(BackupError::ServerUnavailable {
                url: settings.server_url,
                reason,
            });
        }
    }

    let tool = JoplinCli::from_settings(&settings);
    match tool.locate() {
        Some(path) => tracing::debug!(path = %path.display(), "Found Joplin client"),
        None => tracing::warn!(
            program = %settings.tool_program.display(),
            "Joplin client not found on PATH; every account will fail"
        ),
    }

    let summary = BackupRunner::new(&tool, BackupOptions::from_settings(&settings))
        .run(&entries)
        .await;
    Ok(summary.exit_code())
}
