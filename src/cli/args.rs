//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Back up every Joplin Server account listed in the accounts file.
#[derive(Parser, Debug)]
#[command(name = "jbak")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Settings file (TOML); overrides JBAK_CONFIG
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Back up all accounts (default command)
    Backup(BackupArgs),

    /// Check whether the Joplin Server answers on /api/ping
    Ping(PingArgs),

    /// Delete archives older than the retention window without syncing
    Prune(PruneArgs),
}

/// Arguments for the `backup` command.
#[derive(Parser, Debug, Default)]
pub struct BackupArgs {
    /// Accounts file (JSON array of {username, password})
    #[arg(long, value_name = "PATH")]
    pub accounts: Option<PathBuf>,

    /// Directory that holds one subdirectory per account
    #[arg(long, value_name = "DIR")]
    pub backup_root: Option<PathBuf>,

    /// Abort before touching any account if the server ping fails
    #[arg(long)]
    pub require_server: bool,
}

/// Arguments for the `ping` command.
#[derive(Parser, Debug, Default)]
pub struct PingArgs {
    /// Server base URL (defaults to the configured server)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Arguments for the `prune` command.
#[derive(Parser, Debug, Default)]
pub struct PruneArgs {
    /// Directory that holds one subdirectory per account
    #[arg(long, value_name = "DIR")]
    pub backup_root: Option<PathBuf>,

    /// Only prune this account's directory
    #[arg(long, value_name = "USERNAME")]
    pub account: Option<String>,

    /// Keep archives younger than this many days
    #[arg(long, value_name = "DAYS")]
    pub retention_days: Option<u32>,
}
