//! Account credential loading.
//!
//! The credentials file is a JSON array of `{"username": ..., "password": ...}`
//! objects. A broken file stops the run before any account is touched; a
//! broken record only costs that one account.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::archive::is_valid_account_dir_name;
use crate::error::{BackupError, Result};

/// Credentials for one Joplin Server account.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// One element of the credentials array, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEntry {
    /// Usable credentials.
    Valid(Account),
    /// A record missing a username or password.
    Invalid {
        /// Zero-based position in the array.
        index: usize,
        /// Username if the record had one, otherwise `"unknown"`.
        label: String,
        /// Why the record was rejected.
        reason: String,
    },
}

impl AccountEntry {
    /// Name used in log lines for this entry.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Valid(account) => &account.username,
            Self::Invalid { label, .. } => label,
        }
    }

    /// Validate one raw JSON element.
    #[must_use]
    pub fn from_value(index: usize, value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let username = field("username");
        let password = field("password");
        let reason = match (&username, &password) {
            (Some(name), _) if !is_valid_account_dir_name(name) => {
                Some("username is not a valid directory name")
            }
            (Some(_), Some(_)) => None,
            _ if !value.is_object() => Some("record is not an object"),
            (None, None) => Some("missing username and password"),
            (None, Some(_)) => Some("missing username"),
            (Some(_), None) => Some("missing password"),
        };

        match (reason, username, password) {
            (None, Some(username), Some(password)) => Self::Valid(Account { username, password }),
            (reason, username, _) => Self::Invalid {
                index,
                label: username.unwrap_or_else(|| "unknown".to_string()),
                reason: reason.unwrap_or("invalid record").to_string(),
            },
        }
    }

    /// The error describing an invalid entry.
    #[must_use]
    pub fn error(&self) -> Option<BackupError> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid { index, reason, .. } => Some(BackupError::InvalidAccount {
                index: *index,
                reason: reason.clone(),
            }),
        }
    }
}

/// Load and validate the credentials file.
///
/// An empty array is valid and yields an empty list.
///
/// # Errors
///
/// - `AccountsNotFound` if `path` does not exist
/// - `Io` if it cannot be read
/// - `AccountsParse` if it is not valid JSON
/// - `AccountsNotArray` if the top-level value is not an array
pub fn load_accounts(path: &Path) -> Result<Vec<AccountEntry>> {
    tracing::info!(path = %path.display(), "Loading accounts");

    if !path.exists() {
        return Err(BackupError::AccountsNotFound {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| BackupError::AccountsParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let Value::Array(items) = value else {
        return Err(BackupError::AccountsNotArray {
            path: path.display().to_string(),
        });
    };

    let entries: Vec<AccountEntry> = items
        .iter()
        .enumerate()
        .map(|(index, item)| AccountEntry::from_value(index, item))
        .collect();

    tracing::info!(count = entries.len(), "Loaded {} accounts", entries.len());
    Ok(entries)
}
