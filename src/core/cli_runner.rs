//! CLI command runner utilities.
//!
//! Provides async subprocess execution for the Joplin terminal client.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{BackupError, Result};

/// Output from a CLI command.
#[derive(Debug, Clone, Default)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CliOutput {
    /// Check if command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Case-insensitive search across stdout and stderr.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.stdout.to_lowercase().contains(&needle) || self.stderr.to_lowercase().contains(&needle)
    }

    /// Turn a non-zero exit into [`BackupError::CommandFailed`].
    ///
    /// `command` is only used for the error message, so callers pass a
    /// redacted rendering when arguments are secret.
    ///
    /// # Errors
    ///
    /// Returns `CommandFailed` if the exit code is non-zero.
    pub fn into_checked(self, command: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }

        tracing::error!(
            command,
            exit_code = self.exit_code,
            stdout = %self.stdout.trim(),
            stderr = %self.stderr.trim(),
            "Command failed"
        );
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        Err(BackupError::CommandFailed {
            command: command.to_string(),
            exit_code: Some(self.exit_code),
            stderr: detail.chars().take(500).collect(),
        })
    }
}

/// Run a CLI command, optionally bounded by a timeout.
///
/// The output is returned for any exit status; use
/// [`CliOutput::into_checked`] to treat non-zero as an error.
///
/// # Errors
///
/// Returns error if:
/// - Command not found
/// - Command times out
/// - Command fails to execute
pub async fn run_command<S: AsRef<OsStr>>(
    program: &OsStr,
    args: &[S],
    timeout_duration: Option<Duration>,
) -> Result<CliOutput> {
    let program_name = program.to_string_lossy().into_owned();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackupError::ToolNotFound {
                    program: program_name.clone(),
                }
            } else {
                BackupError::CommandFailed {
                    command: program_name.clone(),
                    exit_code: None,
                    stderr: e.to_string(),
                }
            }
        })?;

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let collect = async {
        // Both pipes are drained together so a full buffer on one cannot stall the child.
        let stdout_handle = async move {
            let mut stdout = String::new();
            if let Some(mut out) = stdout_pipe {
                out.read_to_string(&mut stdout).await?;
            }
            Ok::<_, std::io::Error>(stdout)
        };

        let stderr_handle = async move {
            let mut stderr = String::new();
            if let Some(mut err) = stderr_pipe {
                err.read_to_string(&mut stderr).await?;
            }
            Ok::<_, std::io::Error>(stderr)
        };

        let (stdout_result, stderr_result) = tokio::join!(stdout_handle, stderr_handle);
        let stdout = stdout_result?;
        let stderr = stderr_result?;

        let status = child.wait().await?;

        Ok::<_, std::io::Error>(CliOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
        })
    };

    let result = match timeout_duration {
        Some(limit) => match timeout(limit, collect).await {
            Ok(inner) => inner,
            Err(_) => {
                // kill_on_drop reaps the child once `child` goes out of scope
                return Err(BackupError::CommandTimeout {
                    command: program_name,
                    seconds: limit.as_secs(),
                });
            }
        },
        None => collect.await,
    };

    result.map_err(|e| BackupError::CommandFailed {
        command: program_name,
        exit_code: None,
        stderr: e.to_string(),
    })
}
