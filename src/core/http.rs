//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::{BackupError, Result};

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("jbak/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BackupError::Network(e.to_string()))
}

/// Join a base URL and an absolute path without doubling the slash.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
