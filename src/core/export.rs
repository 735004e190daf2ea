//! Exports one account's notes to a dated archive.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::joplin::NoteTool;
use super::session::ProfileSession;
use crate::error::{BackupError, Result};
use crate::storage::archive::archive_path;
use crate::util::format_bytes;

/// Text Joplin prints when a profile has nothing to export.
pub const NO_DATA_MARKER: &str = "no data to export";

/// How an export ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Archive written.
    Exported {
        /// Archive location.
        path: PathBuf,
        /// Archive size in bytes.
        bytes: u64,
    },
    /// The account holds no notes; nothing was written.
    NoData,
}

/// Export to `{account_dir}/{today}.{format}`.
///
/// # Errors
///
/// Returns `Config` if the archive path is not valid UTF-8, `CommandFailed`
/// on a non-zero exit that is not the no-data case, and `ExportMissing` when
/// the tool reports success but no file appears.
pub async fn export_archive<T: NoteTool>(
    session: &ProfileSession<'_, T>,
    account_dir: &Path,
    format: &str,
    today: NaiveDate,
) -> Result<ExportOutcome> {
    let account = session.account();
    let tool = session.tool();
    let path = archive_path(account_dir, today, format);
    let target = path.to_str().ok_or_else(|| {
        BackupError::Config(format!("Archive path is not valid UTF-8: {}", path.display()))
    })?;

    tracing::info!(account, path = %target, "Exporting notes");
    let output = tool.exec(&["export", target, "--format", format]).await?;

    if !output.success() && output.mentions(NO_DATA_MARKER) {
        tracing::warn!(account, "No data to export (account may be empty)");
        return Ok(ExportOutcome::NoData);
    }

    let command = format!("{} export {target} --format {format}", tool.name());
    output.into_checked(&command)?;

    let bytes = match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => {
            tracing::error!(account, path = %target, "Export file not created");
            return Err(BackupError::ExportMissing {
                path: target.to_string(),
            });
        }
    };

    tracing::info!(account, path = %target, bytes, "Backup created: {}", format_bytes(bytes));
    Ok(ExportOutcome::Exported { path, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeTool, TestDir};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[tokio::test]
    async fn writes_dated_archive() {
        let dir = TestDir::new();
        let tool = FakeTool::new();
        let session = ProfileSession::acquire(&tool, "alice");

        let outcome = export_archive(&session, dir.path(), "jex", today()).await.unwrap();
        drop(session);

        let expected = dir.file_path("2024-06-15.jex");
        assert!(matches!(&outcome, ExportOutcome::Exported { path, bytes } if *path == expected && *bytes > 0));
        let call = &tool.calls()[0];
        assert_eq!(call[0], "export");
        assert_eq!(call[2..], ["--format", "jex"]);
    }

    #[tokio::test]
    async fn no_data_is_not_an_error() {
        let dir = TestDir::new();
        let tool = FakeTool::new().no_data_for("empty");
        let session = ProfileSession::acquire(&tool, "empty");
        tool.exec(&["config", "sync.9.username", "empty"]).await.unwrap();

        let outcome = export_archive(&session, dir.path(), "jex", today()).await.unwrap();

        assert_eq!(outcome, ExportOutcome::NoData);
        assert!(!dir.file_exists("2024-06-15.jex"));
    }

    #[tokio::test]
    async fn other_failures_are_errors() {
        let dir = TestDir::new();
        let tool = FakeTool::new().fail_command_for_anyone("export");
        let session = ProfileSession::acquire(&tool, "alice");

        let err = export_archive(&session, dir.path(), "jex", today()).await.unwrap_err();
        assert!(matches!(err, BackupError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_directory_is_rejected_before_export() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TestDir::new();
        let account_dir = dir.path().join(OsStr::from_bytes(b"caf\xe9"));
        let tool = FakeTool::new();
        let session = ProfileSession::acquire(&tool, "alice");

        let err = export_archive(&session, &account_dir, "jex", today()).await.unwrap_err();

        assert!(matches!(err, BackupError::Config(_)));
        assert_eq!(tool.count_of("export"), 0);
    }

    #[tokio::test]
    async fn success_without_file_is_an_error() {
        let dir = TestDir::new();
        let tool = FakeTool::new().without_export_file();
        let session = ProfileSession::acquire(&tool, "alice");

        let err = export_archive(&session, dir.path(), "jex", today()).await.unwrap_err();
        assert!(matches!(err, BackupError::ExportMissing { .. }));
    }
}
