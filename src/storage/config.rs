//! Settings file loading and resolution.
//!
//! Loads the optional settings file from:
//! - Linux: `~/.config/jbak/config.toml`
//! - macOS: `~/Library/Application Support/org.jbak.jbak/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Settings file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `JBAK_CONFIG`: Override settings file path
//! - `JBAK_ACCOUNTS_FILE`: Credentials JSON file
//! - `JBAK_BACKUP_ROOT`: Root directory for per-account archives
//! - `JBAK_SERVER_URL`: Joplin Server base URL
//! - `JBAK_REQUIRE_SERVER`: Abort the run if the server ping fails (1, true, yes)
//! - `JBAK_PING_TIMEOUT`: Ping timeout in seconds
//! - `JBAK_TOOL`: Joplin CLI program
//! - `JBAK_PROFILE_DIR`: Joplin profile directory wiped between accounts
//! - `JBAK_COMMAND_TIMEOUT`: Per-command timeout in seconds (0 = none)
//! - `JBAK_SYNC_PASSES`, `JBAK_SYNC_DELAY`, `JBAK_SETTLE_DELAY`: Sync tuning
//! - `JBAK_EXPORT_FORMAT`: Export format and archive extension
//! - `JBAK_RETENTION_DAYS`: Days archives are kept

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::archive::{DEFAULT_EXTENSION, DEFAULT_RETENTION_DAYS};
use super::paths::{AppPaths, DEFAULT_ACCOUNTS_FILE, DEFAULT_BACKUP_ROOT};
use crate::cli::args::{BackupArgs, PingArgs, PruneArgs};
use crate::core::health::DEFAULT_PING_TIMEOUT;
use crate::core::joplin::DEFAULT_PROGRAM;
use crate::core::sync::{DEFAULT_PASS_DELAY, DEFAULT_SETTLE_DELAY, DEFAULT_SYNC_PASSES, SyncPlan};
use crate::error::{BackupError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override settings file path.
pub const ENV_CONFIG: &str = "JBAK_CONFIG";
pub const ENV_ACCOUNTS_FILE: &str = "JBAK_ACCOUNTS_FILE";
pub const ENV_BACKUP_ROOT: &str = "JBAK_BACKUP_ROOT";
pub const ENV_SERVER_URL: &str = "JBAK_SERVER_URL";
pub const ENV_REQUIRE_SERVER: &str = "JBAK_REQUIRE_SERVER";
pub const ENV_PING_TIMEOUT: &str = "JBAK_PING_TIMEOUT";
pub const ENV_TOOL: &str = "JBAK_TOOL";
pub const ENV_PROFILE_DIR: &str = "JBAK_PROFILE_DIR";
pub const ENV_COMMAND_TIMEOUT: &str = "JBAK_COMMAND_TIMEOUT";
pub const ENV_SYNC_PASSES: &str = "JBAK_SYNC_PASSES";
pub const ENV_SYNC_DELAY: &str = "JBAK_SYNC_DELAY";
pub const ENV_SETTLE_DELAY: &str = "JBAK_SETTLE_DELAY";
pub const ENV_EXPORT_FORMAT: &str = "JBAK_EXPORT_FORMAT";
pub const ENV_RETENTION_DAYS: &str = "JBAK_RETENTION_DAYS";

/// Joplin Server's default local address.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:22300";

/// Upper bound on sync passes.
const MAX_SYNC_PASSES: u32 = 10;

// =============================================================================
// Resolved Settings
// =============================================================================

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from settings file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Values a subcommand may set on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub accounts_file: Option<PathBuf>,
    pub backup_root: Option<PathBuf>,
    pub server_url: Option<String>,
    pub require_server: Option<bool>,
    pub ping_timeout_secs: Option<u64>,
    pub retention_days: Option<u32>,
}

impl From<&BackupArgs> for Overrides {
    fn from(args: &BackupArgs) -> Self {
        Self {
            accounts_file: args.accounts.clone(),
            backup_root: args.backup_root.clone(),
            require_server: args.require_server.then_some(true),
            ..Self::default()
        }
    }
}

impl From<&PingArgs> for Overrides {
    fn from(args: &PingArgs) -> Self {
        Self {
            server_url: args.url.clone(),
            ping_timeout_secs: args.timeout,
            ..Self::default()
        }
    }
}

impl From<&PruneArgs> for Overrides {
    fn from(args: &PruneArgs) -> Self {
        Self {
            backup_root: args.backup_root.clone(),
            retention_days: args.retention_days,
            ..Self::default()
        }
    }
}

/// Fully resolved settings after merging CLI, env vars, and settings file.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Credentials JSON file.
    pub accounts_file: PathBuf,
    /// Root of the per-account archive directories.
    pub backup_root: PathBuf,
    /// Joplin Server base URL.
    pub server_url: String,
    /// Abort the run when the server ping fails.
    pub require_server: bool,
    /// Timeout for the server ping.
    pub ping_timeout: Duration,
    /// Joplin CLI program.
    pub tool_program: PathBuf,
    /// Joplin profile directory, wiped after every account.
    pub profile_dir: PathBuf,
    /// Optional bound on each Joplin CLI invocation.
    pub command_timeout: Option<Duration>,
    /// Number of sync passes per account.
    pub sync_passes: u32,
    /// Pause between sync passes.
    pub sync_delay: Duration,
    /// Pause after the last sync pass.
    pub settle_delay: Duration,
    /// Export format, also used as the archive extension.
    pub export_format: String,
    /// Days archives are kept.
    pub retention_days: u32,
    /// Source of each setting for debugging.
    pub sources: BTreeMap<&'static str, ConfigSource>,
}

impl Settings {
    /// Resolve settings from CLI overrides, environment variables and the
    /// settings file.
    ///
    /// The settings file is `config_path` if given, otherwise `JBAK_CONFIG`,
    /// otherwise the platform default.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The settings file exists but is invalid
    /// - An environment variable cannot be parsed
    /// - Any resolved value is out of range
    pub fn resolve(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
            .unwrap_or_else(|| AppPaths::new().config_file());

        let file = ConfigFile::load_from(&path)?;
        let settings = Self::resolve_from(overrides, &file, |key| std::env::var(key).ok())?;

        for (key, source) in &settings.sources {
            tracing::debug!(setting = key, %source, "Resolved setting");
        }
        Ok(settings)
    }

    /// Resolve settings with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::resolve`], minus file loading.
    pub fn resolve_from(
        overrides: &Overrides,
        file: &ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut r = Resolver {
            env: &env,
            sources: BTreeMap::new(),
        };

        let accounts_file = r.pick(
            "accounts_file",
            overrides.accounts_file.clone(),
            ENV_ACCOUNTS_FILE,
            parse_path,
            file.paths.accounts_file.clone(),
            PathBuf::from(DEFAULT_ACCOUNTS_FILE),
        )?;
        let backup_root = r.pick(
            "backup_root",
            overrides.backup_root.clone(),
            ENV_BACKUP_ROOT,
            parse_path,
            file.paths.backup_root.clone(),
            PathBuf::from(DEFAULT_BACKUP_ROOT),
        )?;
        let server_url = r.pick(
            "server_url",
            overrides.server_url.clone(),
            ENV_SERVER_URL,
            parse_string,
            file.server.url.clone(),
            DEFAULT_SERVER_URL.to_string(),
        )?;
        let require_server = r.pick(
            "require_server",
            overrides.require_server,
            ENV_REQUIRE_SERVER,
            parse_bool,
            file.server.require,
            false,
        )?;
        let ping_timeout_secs = r.pick(
            "ping_timeout_secs",
            overrides.ping_timeout_secs,
            ENV_PING_TIMEOUT,
            parse_u64,
            file.server.ping_timeout_secs,
            DEFAULT_PING_TIMEOUT.as_secs(),
        )?;
        let tool_program = r.pick(
            "tool_program",
            None,
            ENV_TOOL,
            parse_path,
            file.tool.program.clone(),
            PathBuf::from(DEFAULT_PROGRAM),
        )?;
        let profile_dir = r.pick(
            "profile_dir",
            None,
            ENV_PROFILE_DIR,
            parse_path,
            file.tool.profile_dir.clone(),
            AppPaths::new().joplin_profile_dir(),
        )?;
        let command_timeout_secs = r.pick(
            "command_timeout_secs",
            None,
            ENV_COMMAND_TIMEOUT,
            parse_u64,
            file.tool.command_timeout_secs,
            0,
        )?;
        let export_format = r.pick(
            "export_format",
            None,
            ENV_EXPORT_FORMAT,
            parse_string,
            file.tool.export_format.clone(),
            DEFAULT_EXTENSION.to_string(),
        )?;
        let sync_passes = r.pick(
            "sync_passes",
            None,
            ENV_SYNC_PASSES,
            parse_u32,
            file.sync.passes,
            DEFAULT_SYNC_PASSES,
        )?;
        let sync_delay_secs = r.pick(
            "sync_delay_secs",
            None,
            ENV_SYNC_DELAY,
            parse_u64,
            file.sync.delay_secs,
            DEFAULT_PASS_DELAY.as_secs(),
        )?;
        let settle_delay_secs = r.pick(
            "settle_delay_secs",
            None,
            ENV_SETTLE_DELAY,
            parse_u64,
            file.sync.settle_secs,
            DEFAULT_SETTLE_DELAY.as_secs(),
        )?;
        let retention_days = r.pick(
            "retention_days",
            overrides.retention_days,
            ENV_RETENTION_DAYS,
            parse_u32,
            file.retention.days,
            DEFAULT_RETENTION_DAYS,
        )?;

        let settings = Self {
            accounts_file,
            backup_root,
            server_url: server_url.trim_end_matches('/').to_string(),
            require_server,
            ping_timeout: Duration::from_secs(ping_timeout_secs),
            tool_program,
            profile_dir,
            command_timeout: (command_timeout_secs > 0)
                .then(|| Duration::from_secs(command_timeout_secs)),
            sync_passes,
            sync_delay: Duration::from_secs(sync_delay_secs),
            settle_delay: Duration::from_secs(settle_delay_secs),
            export_format,
            retention_days,
            sources: r.sources,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Sync tunables as a [`SyncPlan`].
    #[must_use]
    pub const fn sync_plan(&self) -> SyncPlan {
        SyncPlan {
            passes: self.sync_passes,
            pass_delay: self.sync_delay,
            settle_delay: self.settle_delay,
        }
    }

    /// Where a setting came from.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.sources.get(key).copied().unwrap_or_default()
    }

    /// Validate resolved values.
    ///
    /// Checks that:
    /// - The backup root is valid UTF-8
    /// - The server URL is http(s)
    /// - Sync passes are between 1 and 10
    /// - Retention is at least one day
    /// - Ping timeout is between 1 and 300 seconds
    /// - The export format is a plain alphanumeric word
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.backup_root.to_str().is_none() {
            return Err(BackupError::Config(format!(
                "Backup root must be valid UTF-8: {}",
                self.backup_root.display()
            )));
        }

        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(BackupError::Config(format!(
                "Invalid server URL \"{}\": must start with http:// or https://",
                self.server_url
            )));
        }

        if self.sync_passes == 0 || self.sync_passes > MAX_SYNC_PASSES {
            return Err(BackupError::Config(format!(
                "Sync passes must be between 1 and {MAX_SYNC_PASSES}"
            )));
        }

        if self.retention_days == 0 {
            return Err(BackupError::Config(
                "Retention days must be greater than 0".to_string(),
            ));
        }

        let timeout = self.ping_timeout.as_secs();
        if timeout == 0 || timeout > 300 {
            return Err(BackupError::Config(
                "Ping timeout must be between 1 and 300 seconds".to_string(),
            ));
        }

        if self.export_format.is_empty()
            || !self.export_format.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(BackupError::Config(format!(
                "Invalid export format \"{}\"",
                self.export_format
            )));
        }

        Ok(())
    }
}

/// Applies CLI > env > file > default for one key and records the winner.
struct Resolver<'e, E: Fn(&str) -> Option<String>> {
    env: &'e E,
    sources: BTreeMap<&'static str, ConfigSource>,
}

impl<E: Fn(&str) -> Option<String>> Resolver<'_, E> {
    fn pick<T>(
        &mut self,
        key: &'static str,
        cli: Option<T>,
        env_var: &str,
        parse: fn(&str, &str) -> Result<T>,
        file: Option<T>,
        default: T,
    ) -> Result<T> {
        // 1. CLI flag
        if let Some(value) = cli {
            self.sources.insert(key, ConfigSource::Cli);
            return Ok(value);
        }

        // 2. Environment variable (blank counts as unset)
        if let Some(raw) = (self.env)(env_var).filter(|v| !v.trim().is_empty()) {
            self.sources.insert(key, ConfigSource::Env);
            return parse(env_var, raw.trim());
        }

        // 3. Settings file
        if let Some(value) = file {
            self.sources.insert(key, ConfigSource::ConfigFile);
            return Ok(value);
        }

        // 4. Default
        self.sources.insert(key, ConfigSource::Default);
        Ok(default)
    }
}

fn parse_path(_var: &str, raw: &str) -> Result<PathBuf> {
    Ok(PathBuf::from(raw))
}

fn parse_string(_var: &str, raw: &str) -> Result<String> {
    Ok(raw.to_string())
}

fn parse_u32(var: &str, raw: &str) -> Result<u32> {
    raw.parse()
        .map_err(|_| BackupError::Config(format!("{var} must be a non-negative integer, got \"{raw}\"")))
}

fn parse_u64(var: &str, raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| BackupError::Config(format!("{var} must be a non-negative integer, got \"{raw}\"")))
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BackupError::Config(format!(
            "{var} must be a boolean (1/0, true/false, yes/no), got \"{raw}\""
        ))),
    }
}

// =============================================================================
// Settings File
// =============================================================================

/// Settings file contents. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Input and output locations.
    pub paths: PathsSection,
    /// Joplin Server settings.
    pub server: ServerSection,
    /// Joplin CLI settings.
    pub tool: ToolSection,
    /// Sync pass tuning.
    pub sync: SyncSection,
    /// Archive retention.
    pub retention: RetentionSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub accounts_file: Option<PathBuf>,
    pub backup_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub url: Option<String>,
    pub require: Option<bool>,
    pub ping_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSection {
    pub program: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
    pub command_timeout_secs: Option<u64>,
    pub export_format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub passes: Option<u32>,
    pub delay_secs: Option<u64>,
    pub settle_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSection {
    pub days: Option<u32>,
}

impl ConfigFile {
    /// Load the settings file from a specific path.
    ///
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be read, and `Config` if
    /// it is not valid TOML for these sections.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| BackupError::Config(format!("Invalid config file {}: {e}", path.display())))
    }
}
