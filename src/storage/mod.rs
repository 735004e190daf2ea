//! Credentials, settings, and archive storage.

pub mod accounts;
pub mod archive;
pub mod config;
pub mod paths;

pub use accounts::{Account, AccountEntry, load_accounts};
pub use archive::{PruneReport, prune_archives};
pub use config::{ConfigFile, ConfigSource, Overrides, Settings};
pub use paths::AppPaths;
