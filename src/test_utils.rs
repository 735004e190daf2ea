//! Test utilities for jbak.
//!
//! Provides shared helpers, test data factories, a scripted stand-in for the
//! Joplin client, and assertion macros for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use jbak::test_utils::*;
//!
//! let dir = TestDir::new();
//! dir.create_file("accounts.json", &make_test_accounts_json(2));
//!
//! let tool = FakeTool::new().fail_command("user2@example.org", "sync");
//! ```

use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::core::cli_runner::CliOutput;
use crate::core::joplin::NoteTool;
use crate::error::{BackupError, Result};
use crate::storage::accounts::Account;

// =============================================================================
// Test Data Factories
// =============================================================================

/// Create an `Account` with the given credentials.
#[must_use]
pub fn make_test_account(username: &str, password: &str) -> Account {
    Account {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// Username of the `n`th generated test account (1-based).
#[must_use]
pub fn test_username(n: usize) -> String {
    format!("user{n}@example.org")
}

/// A credentials file body with `count` valid accounts.
///
/// # Examples
///
/// ```rust,ignore
/// use jbak::test_utils::make_test_accounts_json;
///
/// let json = make_test_accounts_json(2);
/// assert!(json.contains("user2@example.org"));
/// ```
#[must_use]
pub fn make_test_accounts_json(count: usize) -> String {
    let accounts: Vec<serde_json::Value> = (1..=count)
        .map(|n| {
            serde_json::json!({
                "username": test_username(n),
                "password": format!("secret-{n}"),
            })
        })
        .collect();
    serde_json::Value::Array(accounts).to_string()
}

// =============================================================================
// Scripted Note Tool
// =============================================================================

/// Default `ls` output of [`FakeTool`].
const DEFAULT_LISTING: &str = "Welcome note\nShopping list\n";

/// Default `status` output of [`FakeTool`].
const DEFAULT_STATUS: &str = "# Notes\nNotes: 2/2\nItems: 4/4\n";

/// In-memory stand-in for the Joplin client.
///
/// Records every command, tracks which account the profile is configured for,
/// and counts resets. A username write that lands on a profile still holding
/// another account is recorded as an isolation violation.
///
/// Failures are decided before any state changes, so a failing `config` write
/// for an account leaves the profile exactly as the previous write left it.
#[derive(Debug)]
pub struct FakeTool {
    calls: Mutex<Vec<Vec<String>>>,
    current_user: Mutex<Option<String>>,
    resets: AtomicUsize,
    violations: AtomicUsize,
    failures: Vec<(Option<String>, String)>,
    no_data_users: Vec<String>,
    listing: String,
    failing_reset: bool,
    writes_export_file: bool,
}

impl FakeTool {
    /// A tool where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            current_user: Mutex::new(None),
            resets: AtomicUsize::new(0),
            violations: AtomicUsize::new(0),
            failures: Vec::new(),
            no_data_users: Vec::new(),
            listing: DEFAULT_LISTING.to_string(),
            failing_reset: false,
            writes_export_file: true,
        }
    }

    /// Make `command` exit 1 while the profile is configured for `user`.
    #[must_use]
    pub fn fail_command(mut self, user: &str, command: &str) -> Self {
        self.failures
            .push((Some(user.to_string()), command.to_string()));
        self
    }

    /// Make `command` exit 1 regardless of account.
    #[must_use]
    pub fn fail_command_for_anyone(mut self, command: &str) -> Self {
        self.failures.push((None, command.to_string()));
        self
    }

    /// Make `export` report "No data to export" for `user`.
    #[must_use]
    pub fn no_data_for(mut self, user: &str) -> Self {
        self.no_data_users.push(user.to_string());
        self
    }

    /// Replace the `ls` output.
    #[must_use]
    pub fn with_listing(mut self, listing: &str) -> Self {
        self.listing = listing.to_string();
        self
    }

    /// Start with the profile still configured for `user`, as a run that
    /// was killed before its cleanup would leave it.
    #[must_use]
    pub fn with_leftover_profile(self, user: &str) -> Self {
        *lock(&self.current_user) = Some(user.to_string());
        self
    }

    /// Make every reset fail.
    #[must_use]
    pub const fn with_failing_reset(mut self) -> Self {
        self.failing_reset = true;
        self
    }

    /// Make `export` succeed without writing the archive.
    #[must_use]
    pub const fn without_export_file(mut self) -> Self {
        self.writes_export_file = false;
        self
    }

    /// Every command run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }

    /// Number of calls whose first argument is `command`.
    #[must_use]
    pub fn count_of(&self, command: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.first().is_some_and(|c| c == command))
            .count()
    }

    /// Number of profile resets so far.
    #[must_use]
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Number of times an account was configured over another without a reset.
    #[must_use]
    pub fn isolation_violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    /// Account the profile is configured for right now.
    #[must_use]
    pub fn current_user(&self) -> Option<String> {
        lock(&self.current_user).clone()
    }

    fn should_fail(&self, user: Option<&str>, command: &str) -> bool {
        self.failures.iter().any(|(who, cmd)| {
            cmd == command && who.as_deref().is_none_or(|who| Some(who) == user)
        })
    }

    fn failed(command: &str) -> CliOutput {
        CliOutput {
            stdout: String::new(),
            stderr: format!("Error: {command} failed"),
            exit_code: 1,
        }
    }
}

impl Default for FakeTool {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteTool for FakeTool {
    async fn exec(&self, args: &[&str]) -> Result<CliOutput> {
        lock(&self.calls).push(args.iter().map(ToString::to_string).collect());

        let command = args.first().copied().unwrap_or_default();
        let user = self.current_user();
        if self.should_fail(user.as_deref(), command) {
            return Ok(Self::failed(command));
        }

        let mut output = CliOutput::default();
        match args {
            ["config", "sync.9.username", name] => {
                let mut current = lock(&self.current_user);
                if current.as_deref().is_some_and(|c| c != *name) {
                    self.violations.fetch_add(1, Ordering::SeqCst);
                }
                *current = Some((*name).to_string());
            }
            ["export", path, ..] => {
                if user.as_ref().is_some_and(|u| self.no_data_users.contains(u)) {
                    output.stderr = "Error: No data to export.".to_string();
                    output.exit_code = 1;
                } else if self.writes_export_file {
                    fs::write(path, format!("archive of {}", user.unwrap_or_default()))?;
                }
            }
            ["status"] => output.stdout = DEFAULT_STATUS.to_string(),
            ["ls"] => output.stdout.clone_from(&self.listing),
            _ => {}
        }
        Ok(output)
    }

    fn reset_profile(&self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        *lock(&self.current_user) = None;
        if self.failing_reset {
            return Err(BackupError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "profile is read-only",
            )));
        }
        Ok(())
    }

    fn has_profile(&self) -> bool {
        lock(&self.current_user).is_some()
    }

    fn name(&self) -> &str {
        "fake-joplin"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// Creates an isolated directory that is automatically deleted when
/// the `TestDir` is dropped. Uses the `tempfile` crate internally.
///
/// # Examples
///
/// ```rust,ignore
/// use jbak::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("accounts.json", "[]");
///
/// let accounts = dir.path().join("accounts.json");
/// assert!(accounts.exists());
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file in the temporary directory with the given content.
    ///
    /// Creates parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Create a subdirectory in the temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn create_dir(&self, name: &str) {
        let path = self.inner.path().join(name);
        fs::create_dir_all(&path).expect("Failed to create test directory");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    /// Check if a file exists in the temporary directory.
    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    /// Get the full path to a file in the temporary directory.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }

    /// Sorted file names inside a subdirectory, empty if it does not exist.
    #[must_use]
    pub fn list_dir(&self, name: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.inner.path().join(name)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
///
/// # Examples
///
/// ```rust,ignore
/// use jbak::assert_contains;
///
/// let text = "Backup completed";
/// assert_contains!(text, "completed");
/// ```
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_json_factory_is_valid() {
        let json = make_test_accounts_json(3);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2]["username"], "user3@example.org");
    }

    #[test]
    fn test_dir_creates_and_cleans_up() {
        let path;
        {
            let dir = TestDir::new();
            path = dir.path().to_path_buf();
            dir.create_file("nested/file.txt", "hello");
            assert_eq!(dir.read_file("nested/file.txt").unwrap(), "hello");
            assert_eq!(dir.list_dir("nested"), ["file.txt"]);
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn fake_tool_tracks_current_user_and_violations() {
        let tool = FakeTool::new();
        tool.exec(&["config", "sync.9.username", "a"]).await.unwrap();
        assert_eq!(tool.current_user().as_deref(), Some("a"));

        tool.exec(&["config", "sync.9.username", "b"]).await.unwrap();
        assert_eq!(tool.isolation_violations(), 1);

        tool.reset_profile().unwrap();
        assert_eq!(tool.current_user(), None);
        tool.exec(&["config", "sync.9.username", "c"]).await.unwrap();
        assert_eq!(tool.isolation_violations(), 1);
    }

    #[tokio::test]
    async fn fake_tool_failure_is_scoped_to_user() {
        let tool = FakeTool::new().fail_command("b", "sync");
        tool.exec(&["config", "sync.9.username", "a"]).await.unwrap();
        assert!(tool.exec(&["sync"]).await.unwrap().success());

        tool.reset_profile().unwrap();
        tool.exec(&["config", "sync.9.username", "b"]).await.unwrap();
        assert!(!tool.exec(&["sync"]).await.unwrap().success());
        assert_eq!(tool.count_of("sync"), 2);
    }

    #[test]
    fn assert_contains_macro_works() {
        assert_contains!("Backup completed", "completed");
        assert_not_contains!("Backup completed", "failed");
    }
}
