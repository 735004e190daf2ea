//! Scoped ownership of the tool's single configuration slot.
//!
//! A [`ProfileSession`] stands for "the tool is configured for account X".
//! Dropping it resets the profile, so the next account always starts from a
//! clean slate no matter how the previous one ended.

use super::joplin::NoteTool;

/// Exclusive handle on the note tool while one account is active.
///
/// Every pipeline step takes the session rather than the bare tool. Only one
/// session may exist per tool at a time.
pub struct ProfileSession<'a, T: NoteTool> {
    tool: &'a T,
    account: String,
}

impl<'a, T: NoteTool> ProfileSession<'a, T> {
    /// Claim the tool for `account`.
    pub fn acquire(tool: &'a T, account: &str) -> Self {
        tracing::debug!(account, tool = tool.name(), "Profile acquired");
        Self {
            tool,
            account: account.to_string(),
        }
    }

    /// The underlying tool.
    #[must_use]
    pub const fn tool(&self) -> &T {
        self.tool
    }

    /// Account the profile is currently configured for.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }
}

impl<T: NoteTool> Drop for ProfileSession<'_, T> {
    fn drop(&mut self) {
        tracing::info!(account = %self.account, "Cleaning up Joplin configuration");
        if let Err(e) = self.tool.reset_profile() {
            tracing::warn!(
                account = %self.account,
                error = %e,
                "Failed to remove Joplin configuration"
            );
        }
    }
}
