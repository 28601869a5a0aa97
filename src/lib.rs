// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # feed-pager
//!
//! Incremental offset/limit loading for feed-style lists: refresh from the
//! top, load more at the bottom, stop at the end.
//!
//! ## Features
//!
//! - **Single in-flight fetch**: concurrent triggers collapse into one request
//! - **End tracking**: appends stop once the server's total is reached
//! - **Failure reporting**: failed fetches leave the list intact and are
//!   recorded as `last_error`
//! - **Timeouts and detachment**: a hung or abandoned fetch never blocks the feed
//! - **HTTP source**: retry, backoff and rate limiting for `GET /feed`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feed_pager::{FeedConfig, HttpFeedSource, PageFetcher, Trigger};
//!
//! #[tokio::main]
//! async fn main() -> feed_pager::Result<()> {
//!     let config = FeedConfig::new("https://api.example.com");
//!     let source = HttpFeedSource::from_config(&config)?;
//!     let feed = PageFetcher::with_options(source, config.fetch_options());
//!
//!     feed.handle(Trigger::ScreenActivated).await;
//!     feed.handle(Trigger::ScrolledNearEnd).await;
//!
//!     let view = feed.view();
//!     println!("{} items, end reached: {}", view.items.len(), view.end_reached);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   Trigger ──► PageFetcher::load(mode) ──► DataSource::fetch_page(params)
//!                    │                            │
//!                    │  guard: fetching?          ├─ HttpFeedSource (HttpClient)
//!                    │  guard: end reached?       └─ StaticSource
//!                    ▼
//!              PaginationState ──► FeedView (items, loading kind, last_error)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Feed data model and shared types
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Incremental page fetching
pub mod pagination;

/// Data sources (HTTP, in-memory)
pub mod source;

/// Render snapshot and UI triggers
pub mod view;

/// Feed configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, FetchFailure, Result};
pub use types::*;

pub use config::FeedConfig;
pub use pagination::{
    FetchOptions, FetchScope, LoadOutcome, PageFetcher, PaginationState, RefreshPolicy, SkipReason,
};
pub use source::{DataSource, HttpFeedSource, StaticSource};
pub use view::{item_key, FeedView, LoadingKind, Trigger};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
