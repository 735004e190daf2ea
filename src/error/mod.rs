//! Error types for jbak.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into four categories:
//! - **Configuration**: credential file or settings problems. Fatal when they
//!   happen before any account is processed.
//! - **Command**: the Joplin CLI could not be run or reported a failure.
//!   Caught per account; never ends the whole run.
//! - **Network**: the Joplin Server could not be reached.
//! - **Internal**: filesystem failures.
//!
//! Each error has a stable error code (e.g., `JBAK-C001`) for log filtering.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential file or settings issues.
    Configuration,
    /// External tool invocation failures.
    Command,
    /// Server reachability issues.
    Network,
    /// Internal errors (filesystem I/O).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::Command => "Command error",
            Self::Network => "Network error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Configuration => "C",
            Self::Command => "K",
            Self::Network => "N",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
///
/// Cron and container supervisors only distinguish success from failure, so
/// every failure collapses to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Every account backed up (or there was nothing to do).
    Success = 0,
    /// At least one account failed, or the run could not start.
    Failure = 1,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Main error type for jbak operations.
#[derive(Error, Debug)]
pub enum BackupError {
    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Credential file does not exist.
    #[error("accounts file not found: {path}")]
    AccountsNotFound { path: String },

    /// Credential file is not valid JSON.
    #[error("invalid JSON in accounts file {path}: {message}")]
    AccountsParse { path: String, message: String },

    /// Credential file parsed but its top-level value is not an array.
    #[error("accounts file must contain a JSON array: {path}")]
    AccountsNotArray { path: String },

    /// A single account record is unusable.
    #[error("invalid account #{index}: {reason}")]
    InvalidAccount { index: usize, reason: String },

    /// Generic settings error.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // Command errors (Category: Command)
    // ==========================================================================
    /// The external tool binary could not be found.
    #[error("command not found: {program}")]
    ToolNotFound { program: String },

    /// The external tool exited unsuccessfully or could not be spawned.
    #[error("command failed: {command} (exit code {}): {stderr}", display_exit(*.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The external tool did not finish in time.
    #[error("command timed out after {seconds}s: {command}")]
    CommandTimeout { command: String, seconds: u64 },

    /// Export reported success but produced no file.
    #[error("backup file not created: {path}")]
    ExportMissing { path: String },

    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// The ping endpoint did not answer with 200.
    #[error("server unavailable at {url}: {reason}")]
    ServerUnavailable { url: String, reason: String },

    /// Generic network error.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_exit(code: Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl BackupError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        ExitCode::Failure
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AccountsNotFound { .. }
            | Self::AccountsParse { .. }
            | Self::AccountsNotArray { .. }
            | Self::InvalidAccount { .. }
            | Self::Config(_) => ErrorCategory::Configuration,

            Self::ToolNotFound { .. }
            | Self::CommandFailed { .. }
            | Self::CommandTimeout { .. }
            | Self::ExportMissing { .. } => ErrorCategory::Command,

            Self::ServerUnavailable { .. } | Self::Network(_) => ErrorCategory::Network,

            Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `JBAK-{category}{number}` where category is:
    /// - C: Configuration
    /// - K: Command
    /// - N: Network
    /// - X: Internal
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountsNotFound { .. } => "JBAK-C001",
            Self::AccountsParse { .. } => "JBAK-C002",
            Self::AccountsNotArray { .. } => "JBAK-C003",
            Self::InvalidAccount { .. } => "JBAK-C004",
            Self::Config(_) => "JBAK-C010",

            Self::ToolNotFound { .. } => "JBAK-K001",
            Self::CommandFailed { .. } => "JBAK-K002",
            Self::CommandTimeout { .. } => "JBAK-K003",
            Self::ExportMissing { .. } => "JBAK-K004",

            Self::ServerUnavailable { .. } => "JBAK-N001",
            Self::Network(_) => "JBAK-N099",

            Self::Io(_) => "JBAK-X001",
        }
    }
}

/// Result type alias for jbak operations.
pub type Result<T> = std::result::Result<T, BackupError>;
