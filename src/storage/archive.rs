//! Dated archive files and retention pruning.
//!
//! Layout: `{backup_root}/{username}/{YYYY-MM-DD}.{ext}`. The date in the
//! file name is the only thing pruning looks at; file timestamps are ignored
//! so that copying archives around does not change their age.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{BackupError, Result};

/// Date layout used in archive file names.
pub const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default archive extension (Joplin Export format).
pub const DEFAULT_EXTENSION: &str = "jex";

/// Default number of days an archive is kept.
pub const DEFAULT_RETENTION_DAYS: u32 = 14;

/// File name for the archive taken on `date`.
#[must_use]
pub fn archive_file_name(date: NaiveDate, extension: &str) -> String {
    format!("{}.{extension}", date.format(ARCHIVE_DATE_FORMAT))
}

/// Full path of the archive for `date` inside an account directory.
#[must_use]
pub fn archive_path(account_dir: &Path, date: NaiveDate, extension: &str) -> PathBuf {
    account_dir.join(archive_file_name(date, extension))
}

/// Whether `username` names exactly one directory directly under the root.
#[must_use]
pub fn is_valid_account_dir_name(username: &str) -> bool {
    !matches!(username, "" | "." | "..") && !username.contains(['/', '\\', '\0'])
}

/// Directory holding one account's archives.
///
/// # Errors
///
/// Returns `Config` if `username` could resolve outside `backup_root`.
pub fn account_dir(backup_root: &Path, username: &str) -> Result<PathBuf> {
    if !is_valid_account_dir_name(username) {
        return Err(BackupError::Config(format!(
            "Username cannot be used as a backup directory name: {username:?}"
        )));
    }
    Ok(backup_root.join(username))
}

/// Parse the date out of an archive path's file stem.
#[must_use]
pub fn parse_archive_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, ARCHIVE_DATE_FORMAT).ok()
}

/// Whether an archive dated `date` has aged out on `today`.
///
/// An archive exactly `retention_days` old is already expired, so with the
/// default window the newest fourteen days (today included) survive.
#[must_use]
pub fn is_expired(date: NaiveDate, today: NaiveDate, retention_days: u32) -> bool {
    (today - date).num_days() >= i64::from(retention_days)
}

/// What a pruning pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Archives deleted.
    pub removed: Vec<PathBuf>,
    /// Archives still inside the window.
    pub kept: Vec<PathBuf>,
    /// Files with the archive extension whose name is not a date.
    pub skipped: Vec<PathBuf>,
}

impl PruneReport {
    /// Number of archives deleted.
    #[must_use]
    pub const fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Delete archives in `dir` that have aged out of the retention window.
///
/// Only regular files with `extension` are considered. Names that do not
/// parse as a date are skipped with a warning and never deleted. A missing
/// directory prunes nothing.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read or an expired
/// archive cannot be deleted.
pub fn prune_archives(
    dir: &Path,
    extension: &str,
    retention_days: u32,
    today: NaiveDate,
) -> Result<PruneReport> {
    tracing::info!(
        dir = %dir.display(),
        retention_days,
        "Cleaning up backups older than {retention_days} days"
    );

    let mut report = PruneReport::default();
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "Backup directory does not exist");
        return Ok(report);
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches_ext = path.extension().and_then(|e| e.to_str()) == Some(extension);
        if matches_ext && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();

    for path in candidates {
        let Some(date) = parse_archive_date(&path) else {
            tracing::warn!(path = %path.display(), "Skipping file with invalid date format");
            report.skipped.push(path);
            continue;
        };

        if is_expired(date, today, retention_days) {
            tracing::info!(path = %path.display(), "Removing old backup");
            std::fs::remove_file(&path)?;
            report.removed.push(path);
        } else {
            report.kept.push(path);
        }
    }

    if report.removed.is_empty() {
        tracing::info!("No old backups to remove");
    } else {
        tracing::info!(count = report.removed_count(), "Removed {} old backup(s)", report.removed_count());
    }

    Ok(report)
}
