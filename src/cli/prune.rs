//! Prune command implementation.

use std::path::Path;

use chrono::Local;

use crate::cli::args::PruneArgs;
use crate::error::{ExitCode, Result};
use crate::storage::archive::{account_dir, prune_archives};
use crate::storage::config::{Overrides, Settings};

/// Execute the prune command.
///
/// Applies retention to one account directory (`--account`) or to every
/// directory under the backup root. The Joplin client is never invoked.
///
/// # Errors
///
/// Returns an error if the settings are invalid, `--account` is not a plain
/// directory name, or the backup root cannot be read. A failure inside one account directory is logged and turns the exit
/// code to 1 without stopping the others.
pub fn execute(args: &PruneArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let settings = Settings::resolve(config_path, &Overrides::from(args))?;
    let today = Local::now().date_naive();

    let dirs = match &args.account {
        Some(account) => vec![account_dir(&settings.backup_root, account)?],
        None if settings.backup_root.is_dir() => {
            let mut dirs = Vec::new();
            for entry in std::fs::read_dir(&settings.backup_root)? {
                let path = entry?.path();
                if path.is_dir() {
                    dirs.push(path);
                }
            }
            dirs.sort();
            dirs
        }
        None => {
            tracing::warn!(
                path = %settings.backup_root.display(),
                "Backup root does not exist, nothing to prune"
            );
            Vec::new()
        }
    };

    let mut removed = 0;
    let mut code = ExitCode::Success;
    for dir in &dirs {
        match prune_archives(dir, &settings.export_format, settings.retention_days, today) {
            Ok(report) => removed += report.removed_count(),
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "Failed to prune backups");
                code = ExitCode::Failure;
            }
        }
    }

    tracing::info!(
        directories = dirs.len(),
        removed,
        "Pruned {removed} archive(s) across {} account(s)",
        dirs.len()
    );
    Ok(code)
}
