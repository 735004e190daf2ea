//! Timestamped run logs.
//!
//! Backups run unattended from cron, so the default output is one
//! timestamped line per event on stdout where the scheduler collects it.
//! `JBAK_LOG_FILE` appends to a file instead.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_LEVEL_ENV: &str = "JBAK_LOG";
const LOG_FORMAT_ENV: &str = "JBAK_LOG_FORMAT";
const LOG_FILE_ENV: &str = "JBAK_LOG_FILE";

/// Timestamp layout for human log lines.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Timestamp, level and message.
    #[default]
    Human,
    /// One JSON object per event.
    Json,
    /// Terse single lines with the module target.
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Minimum level of `jbak` events that get written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from a flag or env value (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Directive value for `EnvFilter`.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Where, how and how much to log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Append here instead of stdout.
    pub file: Option<PathBuf>,
}

impl LogOptions {
    /// Combine CLI flags with `JBAK_LOG`, `JBAK_LOG_FORMAT` and `JBAK_LOG_FILE`.
    #[must_use]
    pub fn resolve(cli_level: Option<&str>, json_output: bool, verbose: bool) -> Self {
        Self::resolve_with(cli_level, json_output, verbose, |key| std::env::var(key).ok())
    }

    /// [`LogOptions::resolve`] with an injectable environment.
    ///
    /// Flags win over the environment; blank or unrecognized values are
    /// ignored. `--verbose` raises anything quieter than debug to debug.
    #[must_use]
    pub fn resolve_with(
        cli_level: Option<&str>,
        json_output: bool,
        verbose: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env_value = |key: &str| env(key).filter(|v: &String| !v.trim().is_empty());

        let level = cli_level
            .and_then(LogLevel::from_arg)
            .or_else(|| env_value(LOG_LEVEL_ENV).as_deref().and_then(LogLevel::from_arg))
            .unwrap_or_default();
        let level = if verbose { level.min(LogLevel::Debug) } else { level };

        let format = if json_output {
            LogFormat::Json
        } else {
            env_value(LOG_FORMAT_ENV)
                .as_deref()
                .and_then(LogFormat::from_arg)
                .unwrap_or_default()
        };

        let file = env_value(LOG_FILE_ENV).map(|v| PathBuf::from(v.trim()));

        Self { level, format, file }
    }
}

/// Open the log file for appending, creating it if needed.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened for writing.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// `RUST_LOG`, when set, replaces the level-derived filter entirely. A log
/// file that cannot be opened falls back to stdout, and the first event
/// written says so. Only the first call in a process takes effect.
pub fn init(options: &LogOptions) {
    let mut open_failure = None;
    let writer = match &options.file {
        Some(path) => match open_log_file(path) {
            Ok(file) => BoxMakeWriter::new(file),
            Err(e) => {
                open_failure = Some((path, e));
                BoxMakeWriter::new(io::stdout)
            }
        },
        None => BoxMakeWriter::new(io::stdout),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jbak={}", options.level.as_filter())));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    let installed = match options.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().with_target(true).try_init(),
        LogFormat::Human => builder
            .with_target(false)
            .with_ansi(false)
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .try_init(),
    };

    if installed.is_ok()
        && let Some((path, e)) = open_failure
    {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Cannot open log file, logging to stdout"
        );
    }
}
