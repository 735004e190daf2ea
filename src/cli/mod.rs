//! CLI command definitions and handlers.

pub mod args;
pub mod backup;
pub mod ping;
pub mod prune;

pub use args::{Cli, Commands};
