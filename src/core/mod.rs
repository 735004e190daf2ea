//! Backup steps and the pipeline that strings them together.

pub mod cli_runner;
pub mod configure;
pub mod export;
pub mod health;
pub mod http;
pub mod joplin;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod sync;

pub use cli_runner::{CliOutput, run_command};
pub use export::{ExportOutcome, export_archive};
pub use health::{HealthChecker, PingReport, check_server_availability};
pub use joplin::{JoplinCli, NoteTool};
pub use pipeline::{AccountOutcome, AccountReport, BackupOptions, BackupRunner, BackupSummary};
pub use session::ProfileSession;
pub use sync::{SyncPlan, sync_notes, verify_notes};
