//! The Joplin terminal client as an external tool.
//!
//! [`NoteTool`] is the seam between the backup pipeline and the subprocess:
//! production uses [`JoplinCli`], tests substitute a scripted fake.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::cli_runner::{CliOutput, run_command};
use crate::error::Result;
use crate::storage::config::Settings;

/// Default program name of the Joplin terminal client.
pub const DEFAULT_PROGRAM: &str = "joplin";

/// An external note tool holding exactly one account's configuration at a time.
#[allow(async_fn_in_trait)]
pub trait NoteTool {
    /// Run one tool command and capture its output, whatever the exit status.
    ///
    /// # Errors
    ///
    /// Returns an error only when the command could not be run at all.
    async fn exec(&self, args: &[&str]) -> Result<CliOutput>;

    /// Wipe every piece of per-account state the tool has persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the state exists but could not be removed.
    fn reset_profile(&self) -> Result<()>;

    /// Whether any per-account state is currently persisted.
    fn has_profile(&self) -> bool;

    /// Short name used in log lines and error messages.
    fn name(&self) -> &str {
        DEFAULT_PROGRAM
    }
}

/// Runs the real `joplin` binary against a dedicated profile directory.
#[derive(Debug, Clone)]
pub struct JoplinCli {
    program: PathBuf,
    profile_dir: PathBuf,
    timeout: Option<Duration>,
}

impl JoplinCli {
    /// Create a runner for `program` storing its state under `profile_dir`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            profile_dir: profile_dir.into(),
            timeout: None,
        }
    }

    /// Build from resolved settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.tool_program, &settings.profile_dir)
            .with_timeout(settings.command_timeout)
    }

    /// Bound every invocation by `timeout` (none by default).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The profile directory wiped by [`NoteTool::reset_profile`].
    #[must_use]
    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Resolve the program on `PATH`, if it can be found.
    #[must_use]
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    fn argv(&self, args: &[&str]) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        argv.push(OsString::from("--profile"));
        argv.push(self.profile_dir.clone().into_os_string());
        argv.extend(args.iter().map(OsString::from));
        argv
    }
}

impl NoteTool for JoplinCli {
    async fn exec(&self, args: &[&str]) -> Result<CliOutput> {
        tracing::trace!(
            program = %self.program.display(),
            command = args.first().copied().unwrap_or_default(),
            "Running command"
        );
        run_command(self.program.as_os_str(), &self.argv(args), self.timeout).await
    }

    fn reset_profile(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.profile_dir) {
            Ok(()) => {
                tracing::info!(path = %self.profile_dir.display(), "Removed Joplin profile directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.profile_dir.display(), "No Joplin profile to remove");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn has_profile(&self) -> bool {
        self.profile_dir.exists()
    }

    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_PROGRAM)
    }
}
