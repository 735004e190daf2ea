//! Multi-account backup pipeline.
//!
//! Walks the account list strictly in order. Each account runs
//! configure → sync → export → prune inside a [`ProfileSession`], so the
//! profile is reset after every account however it ended. A profile left
//! behind by an interrupted run is cleared before the first account. One
//! account's failure never stops the run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};

use super::configure::configure_account;
use super::export::{ExportOutcome, export_archive};
use super::joplin::NoteTool;
use super::session::ProfileSession;
use super::sync::{SyncPlan, sync_notes};
use crate::error::{ExitCode, Result};
use crate::storage::accounts::{Account, AccountEntry};
use crate::storage::archive::{account_dir, prune_archives};
use crate::storage::config::Settings;
use crate::util::format_elapsed;

const BANNER_WIDTH: usize = 60;

/// Per-run knobs taken from settings.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub server_url: String,
    pub backup_root: PathBuf,
    pub export_format: String,
    pub retention_days: u32,
    pub sync: SyncPlan,
}

impl BackupOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            server_url: settings.server_url.clone(),
            backup_root: settings.backup_root.clone(),
            export_format: settings.export_format.clone(),
            retention_days: settings.retention_days,
            sync: settings.sync_plan(),
        }
    }
}

/// How one account ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOutcome {
    /// Archive written.
    BackedUp,
    /// Nothing to export; counted as a success.
    NoData,
    /// A step failed or the record was invalid.
    Failed,
}

impl AccountOutcome {
    #[must_use]
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Result of one account.
#[derive(Debug, Clone)]
pub struct AccountReport {
    pub username: String,
    pub outcome: AccountOutcome,
    /// Archive written today, if any.
    pub archive: Option<PathBuf>,
    /// Archives removed by retention.
    pub pruned: usize,
    /// Error text when the account failed.
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl AccountReport {
    fn failed(username: &str, error: String, elapsed: Duration) -> Self {
        Self {
            username: username.to_string(),
            outcome: AccountOutcome::Failed,
            archive: None,
            pruned: 0,
            error: Some(error),
            elapsed,
        }
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Default)]
pub struct BackupSummary {
    pub reports: Vec<AccountReport>,
}

impl BackupSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn successful(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }

    /// 0 when nothing failed (including an empty run), 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.failed() == 0 {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }

    /// Log the final summary block.
    pub fn log(&self) {
        let rule = "=".repeat(BANNER_WIDTH);
        tracing::info!("{rule}");
        tracing::info!("Backup Summary:");
        tracing::info!("  Total accounts: {}", self.total());
        tracing::info!("  Successful: {}", self.successful());
        tracing::info!("  Failed: {}", self.failed());
        for report in self.reports.iter().filter(|r| !r.outcome.is_success()) {
            tracing::info!(
                "    {}: {}",
                report.username,
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
        tracing::info!("{rule}");
    }
}

/// Runs the per-account pipeline against one note tool.
pub struct BackupRunner<'a, T: NoteTool> {
    tool: &'a T,
    options: BackupOptions,
    today: NaiveDate,
}

impl<'a, T: NoteTool> BackupRunner<'a, T> {
    /// Create a runner dating archives with the local calendar date.
    pub fn new(tool: &'a T, options: BackupOptions) -> Self {
        Self {
            tool,
            options,
            today: Local::now().date_naive(),
        }
    }

    /// Pin "today" for archive names and retention.
    #[must_use]
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Process every entry in order and summarize.
    pub async fn run(&self, entries: &[AccountEntry]) -> BackupSummary {
        let rule = "=".repeat(BANNER_WIDTH);
        tracing::info!("{rule}");
        tracing::info!("Starting Joplin multi-account backup");
        tracing::info!("{rule}");

        if entries.iter().any(|e| matches!(e, AccountEntry::Valid(_))) {
            self.clear_leftover_profile();
        }

        let total = entries.len();
        let mut summary = BackupSummary::default();

        for (i, entry) in entries.iter().enumerate() {
            tracing::info!("Processing account {}/{total}: {}", i + 1, entry.label());
            let report = match entry {
                AccountEntry::Valid(account) => self.process(account).await,
                AccountEntry::Invalid { .. } => {
                    let reason = entry
                        .error()
                        .map_or_else(|| "invalid account".to_string(), |e| e.to_string());
                    tracing::error!(account = entry.label(), "Skipping account: {reason}");
                    AccountReport::failed(entry.label(), reason, Duration::ZERO)
                }
            };
            summary.reports.push(report);
        }

        summary.log();
        summary
    }

    /// A killed run never drops its session, so its account may still be
    /// configured.
    fn clear_leftover_profile(&self) {
        if !self.tool.has_profile() {
            return;
        }
        tracing::warn!(
            tool = self.tool.name(),
            "Found Joplin configuration left by an interrupted run, removing it"
        );
        if let Err(e) = self.tool.reset_profile() {
            tracing::warn!(error = %e, "Failed to remove leftover Joplin configuration");
        }
    }

    async fn process(&self, account: &Account) -> AccountReport {
        let username = account.username.as_str();
        tracing::info!(account = username, "Starting backup for account: {username}");
        let start = Instant::now();

        let result = self.backup_account(account).await;
        let elapsed = start.elapsed();

        match result {
            Ok((outcome, pruned)) => {
                tracing::info!(
                    account = username,
                    elapsed = %format_elapsed(elapsed),
                    "Successfully backed up account: {username}"
                );
                let (outcome, archive) = match outcome {
                    ExportOutcome::Exported { path, .. } => (AccountOutcome::BackedUp, Some(path)),
                    ExportOutcome::NoData => (AccountOutcome::NoData, None),
                };
                AccountReport {
                    username: username.to_string(),
                    outcome,
                    archive,
                    pruned,
                    error: None,
                    elapsed,
                }
            }
            Err(e) => {
                tracing::error!(
                    account = username,
                    code = e.error_code(),
                    error = %e,
                    "Failed to backup account: {username}"
                );
                AccountReport::failed(username, e.to_string(), elapsed)
            }
        }
    }

    /// One account's steps. The session resets the profile when it drops,
    /// which happens before this returns on every path.
    async fn backup_account(&self, account: &Account) -> Result<(ExportOutcome, usize)> {
        let session = ProfileSession::acquire(self.tool, &account.username);

        let dir = account_dir(&self.options.backup_root, &account.username)?;
        std::fs::create_dir_all(&dir)?;

        configure_account(&session, &self.options.server_url, account).await?;
        sync_notes(&session, &self.options.sync).await?;
        let outcome =
            export_archive(&session, &dir, &self.options.export_format, self.today).await?;
        let pruned = prune_archives(
            &dir,
            &self.options.export_format,
            self.options.retention_days,
            self.today,
        )?;

        Ok((outcome, pruned.removed_count()))
    }
}
