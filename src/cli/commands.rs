//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Page through a feed endpoint from the command line
#[derive(Parser, Debug)]
#[command(name = "feed-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feed configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh the feed, then load more pages until the end
    Fetch {
        /// Stop after this many pages
        #[arg(long)]
        pages: Option<usize>,

        /// Items per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Restrict the feed to one owner id
        #[arg(long)]
        filter: Option<String>,

        /// Bearer token for the backend
        #[arg(long)]
        token: Option<String>,
    },

    /// Page through a generated in-memory feed
    Demo {
        /// Number of items in the feed
        #[arg(long, default_value = "12")]
        items: usize,

        /// Items per page
        #[arg(long, default_value = "5")]
        page_size: u32,

        /// Simulated latency per page
        #[arg(long, default_value = "0")]
        latency_ms: u64,
    },

    /// Validate the feed configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON message per line
    Json,
    /// Human-readable output
    Pretty,
}
