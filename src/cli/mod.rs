//! CLI module
//!
//! Command-line interface for paging through feeds.
//!
//! # Commands
//!
//! - `fetch` - Refresh a remote feed and load pages until the end
//! - `demo` - Same against a generated in-memory feed
//! - `validate` - Check a feed configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
