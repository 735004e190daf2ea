//! Integration tests for the Joplin Server health check against a mock server.
//!
//! Covers:
//! - 200 is the only healthy answer
//! - Non-200 statuses
//! - Responses slower than the timeout
//! - Unreachable hosts

mod common;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jbak::core::health::{HealthChecker, PING_PATH, check_server_availability};

use common::log_capture::TestLogCapture;
use common::logger::TestLogger;

async fn server_answering(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PING_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn ok_response_is_available() {
    let log = TestLogger::new("ok_response_is_available");
    log.phase("setup");
    let server = server_answering(200, "{\"status\":\"ok\",\"message\":\"Joplin Server is running\"}").await;

    log.phase("execute");
    log.http_request("GET", &format!("{}{PING_PATH}", server.uri()));
    let checker = HealthChecker::new(Duration::from_secs(5)).unwrap();
    let report = checker.ping(&server.uri()).await;

    log.phase("verify");
    assert!(report.is_available());
    assert_eq!(report.status, Some(200));
    assert!(report.body.as_deref().unwrap().contains("Joplin Server is running"));
    assert!(report.error.is_none());
    log.finish_ok();
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let server = server_answering(200, "ok").await;
    let base = format!("{}/", server.uri());
    assert!(check_server_availability(&base, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn server_errors_are_unavailable() {
    let log = TestLogger::new("server_errors_are_unavailable");

    for status in [500, 503, 404, 401, 204] {
        log.info(&format!("status {status}"));
        let server = server_answering(status, "").await;
        assert!(
            !check_server_availability(&server.uri(), Duration::from_secs(5)).await,
            "status {status} must not count as available"
        );
    }
    log.finish_ok();
}

#[tokio::test]
async fn non_200_is_logged_with_status() {
    let capture = TestLogCapture::start();
    let server = server_answering(503, "maintenance").await;

    let available = check_server_availability(&server.uri(), Duration::from_secs(5)).await;

    assert!(!available);
    capture.assert_logged_at_level(tracing::Level::WARN, "returned status 503");
}

#[tokio::test]
async fn slow_response_times_out() {
    let log = TestLogger::new("slow_response_times_out");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PING_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let checker = HealthChecker::new(Duration::from_millis(300)).unwrap();
    let report = checker.ping(&server.uri()).await;

    assert!(!report.is_available());
    assert!(report.status.is_none());
    assert!(report.error.is_some());
    assert!(report.elapsed < Duration::from_secs(3));
    log.finish_ok();
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let capture = TestLogCapture::start();

    // bind then drop to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{port}");

    assert!(!check_server_availability(&url, Duration::from_secs(2)).await);
    capture.assert_logged_at_level(tracing::Level::ERROR, "Cannot connect to Joplin Server");
}
