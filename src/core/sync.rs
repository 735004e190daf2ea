//! Repeated sync passes plus an informational verification.
//!
//! Joplin's sync does not always converge in a single run: a fresh profile
//! first pulls metadata and only later downloads note bodies and resources.
//! The driver therefore runs a fixed number of passes with pauses between
//! them and then waits once more before anything reads the database.

use std::time::Duration;

use super::joplin::NoteTool;
use super::session::ProfileSession;
use crate::error::Result;

/// Default number of sync passes.
pub const DEFAULT_SYNC_PASSES: u32 = 3;

/// Default pause between passes.
pub const DEFAULT_PASS_DELAY: Duration = Duration::from_secs(3);

/// Default pause after the last pass.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Number of listing lines echoed during verification.
const PREVIEW_LINES: usize = 5;

/// Sync tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPlan {
    /// How many times `sync` runs.
    pub passes: u32,
    /// Pause between consecutive passes.
    pub pass_delay: Duration,
    /// Pause after the final pass.
    pub settle_delay: Duration,
}

impl Default for SyncPlan {
    fn default() -> Self {
        Self {
            passes: DEFAULT_SYNC_PASSES,
            pass_delay: DEFAULT_PASS_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl SyncPlan {
    /// A plan with no pauses, for tests and dry environments.
    #[must_use]
    pub const fn immediate(passes: u32) -> Self {
        Self {
            passes,
            pass_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }
}

/// Run every sync pass, settle, then verify.
///
/// Returns whether verification saw any notes. That value is for logging
/// only; an empty listing is not a failure.
///
/// # Errors
///
/// Returns `CommandFailed` (or `ToolNotFound`/`CommandTimeout`) if any sync
/// pass fails. Verification never fails.
pub async fn sync_notes<T: NoteTool>(session: &ProfileSession<'_, T>, plan: &SyncPlan) -> Result<bool> {
    let account = session.account();
    let tool = session.tool();
    let command = format!("{} sync", tool.name());

    tracing::info!(account, passes = plan.passes, "Syncing notes");

    for pass in 1..=plan.passes {
        tracing::info!(account, "Running sync pass {pass}/{}...", plan.passes);
        let output = tool.exec(&["sync"]).await?.into_checked(&command)?;
        if !output.stdout.trim().is_empty() {
            tracing::debug!(account, pass, output = %output.stdout.trim(), "Sync output");
        }
        tracing::info!(account, "Sync pass {pass} completed");

        if pass < plan.passes {
            pause(plan.pass_delay).await;
        }
    }

    tracing::info!(account, "Waiting for database to flush...");
    pause(plan.settle_delay).await;

    Ok(verify_notes(session).await)
}

/// Query `status` and `ls` and report what the profile now holds.
///
/// Never fails: problems are logged as warnings.
pub async fn verify_notes<T: NoteTool>(session: &ProfileSession<'_, T>) -> bool {
    let account = session.account();
    let tool = session.tool();

    match tool.exec(&["status"]).await {
        Ok(status) => {
            tracing::debug!(account, output = %status.stdout.trim(), "Joplin status");
            for line in status.stdout.lines() {
                let lower = line.to_lowercase();
                if lower.contains("notes:") || lower.contains("items:") {
                    tracing::info!(account, "Status: {}", line.trim());
                }
            }
        }
        Err(e) => tracing::warn!(account, error = %e, "Could not query Joplin status"),
    }

    let listing = match tool.exec(&["ls"]).await {
        Ok(ls) => ls.stdout,
        Err(e) => {
            tracing::warn!(account, error = %e, "Could not verify notes");
            return false;
        }
    };

    let notes: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if notes.is_empty() {
        tracing::warn!(account, "No notes found in 'joplin ls'");
        return false;
    }

    tracing::info!(account, count = notes.len(), "Verified notes exist");
    for line in notes.iter().take(PREVIEW_LINES) {
        tracing::info!(account, "  - {line}");
    }
    true
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
