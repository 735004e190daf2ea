//! Joplin Server health check.
//!
//! Probes `GET {server_url}/api/ping`. Only an HTTP 200 within the timeout
//! counts as available.

use std::time::{Duration, Instant};

use reqwest::Client;

use super::http::{build_client, join_url};
use crate::error::Result;

/// Health endpoint path on Joplin Server.
pub const PING_PATH: &str = "/api/ping";

/// Default timeout for the ping request.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReport {
    /// URL that was requested.
    pub url: String,
    /// HTTP status, if a response arrived.
    pub status: Option<u16>,
    /// Response body (only read on success).
    pub body: Option<String>,
    /// Transport error text, if no response arrived.
    pub error: Option<String>,
    /// Wall-clock time of the request.
    pub elapsed: Duration,
}

impl PingReport {
    /// Whether the server answered 200.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == Some(200)
    }

    /// Log the outcome.
    pub fn log(&self) {
        let elapsed_ms = u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX);
        match (self.status, &self.error) {
            (Some(200), _) => tracing::info!(
                url = %self.url,
                status = 200,
                elapsed_ms,
                body = self.body.as_deref().unwrap_or("").trim(),
                "Joplin Server is available"
            ),
            (Some(status), _) => tracing::warn!(
                url = %self.url,
                status,
                elapsed_ms,
                "Joplin Server returned status {status}"
            ),
            (None, error) => tracing::error!(
                url = %self.url,
                elapsed_ms,
                error = error.as_deref().unwrap_or("unknown error"),
                "Cannot connect to Joplin Server"
            ),
        }
    }
}

/// Pings Joplin Server.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    client: Client,
}

impl HealthChecker {
    /// Create a checker whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    /// Ping `base_url` and describe what happened. Never fails.
    pub async fn ping(&self, base_url: &str) -> PingReport {
        let url = join_url(base_url, PING_PATH);
        tracing::debug!(%url, "Checking Joplin Server availability");
        let start = Instant::now();

        let mut report = PingReport {
            url,
            status: None,
            body: None,
            error: None,
            elapsed: Duration::ZERO,
        };

        match self.client.get(&report.url).send().await {
            Ok(response) => {
                let status = response.status();
                report.status = Some(status.as_u16());
                if status.is_success() {
                    report.body = response.text().await.ok();
                }
            }
            Err(e) if e.is_timeout() => report.error = Some(format!("timed out: {e}")),
            Err(e) => report.error = Some(e.to_string()),
        }

        report.elapsed = start.elapsed();
        report
    }

    /// Whether `base_url` answers its ping with 200.
    pub async fn is_available(&self, base_url: &str) -> bool {
        let report = self.ping(base_url).await;
        report.log();
        report.is_available()
    }
}

/// One-shot availability check.
///
/// Any failure, including failing to build the client, yields `false`.
pub async fn check_server_availability(base_url: &str, timeout: Duration) -> bool {
    match HealthChecker::new(timeout) {
        Ok(checker) => checker.is_available(base_url).await,
        Err(e) => {
            tracing::error!(error = %e, "Cannot build HTTP client");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: Option<u16>) -> PingReport {
        PingReport {
            url: "http://localhost:22300/api/ping".to_string(),
            status,
            body: None,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn only_200_is_available() {
        assert!(report(Some(200)).is_available());
        assert!(!report(Some(204)).is_available());
        assert!(!report(Some(503)).is_available());
        assert!(!report(None).is_available());
    }

    #[tokio::test]
    async fn unreachable_host_reports_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let checker = HealthChecker::new(Duration::from_secs(2)).unwrap();
        let report = checker.ping(&format!("http://127.0.0.1:{port}")).await;
        assert!(!report.is_available());
        assert!(report.status.is_none());
        assert!(report.error.is_some());
    }
}
