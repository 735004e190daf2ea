//! Well-known filesystem locations.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Default credentials file (mounted into the backup container).
pub const DEFAULT_ACCOUNTS_FILE: &str = "/config/accounts.json";

/// Default root of the per-account archive directories.
pub const DEFAULT_BACKUP_ROOT: &str = "/notes_data/backups";

/// Application paths.
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
    /// Home directory, used to find the Joplin profile.
    pub home: PathBuf,
}

impl AppPaths {
    /// Create paths for the jbak application.
    #[must_use]
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let config = ProjectDirs::from("org", "jbak", "jbak").map_or_else(
            || home.join(".config/jbak"),
            |proj_dirs| proj_dirs.config_dir().to_path_buf(),
        );
        Self { config, home }
    }

    /// Path to the settings file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Directory the Joplin terminal client uses for its profile.
    #[must_use]
    pub fn joplin_profile_dir(&self) -> PathBuf {
        self.home.join(".config/joplin")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Module-level function for accessing dirs crate.
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
    }
}
