//! Shared helpers for integration tests.
//!
//! # Modules
//!
//! - `fake_joplin`: Shell-script stand-in for the Joplin client (unix only)
//! - `logger`: Structured test progress output
//! - `log_capture`: Assertions on the crate's tracing output

#[cfg(unix)]
pub mod fake_joplin;
pub mod log_capture;
pub mod logger;
