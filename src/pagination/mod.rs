//! Pagination module
//!
//! Incremental offset/limit loading for feed screens.
//!
//! # Overview
//!
//! [`PageFetcher`] owns a [`PaginationState`] and a [`DataSource`](crate::source::DataSource).
//! A refresh requests offset 0 and replaces the list; an append requests the
//! current offset and extends it. The feed is exhausted once the number of
//! held items reaches the total reported by the server. Only one request is
//! outstanding at a time; loads that arrive meanwhile are skipped.

mod fetcher;
mod scope;
mod types;

pub use fetcher::PageFetcher;
pub use scope::FetchScope;
pub use types::{
    FetchOptions, LoadOutcome, PaginationState, RefreshPolicy, SkipReason, DEFAULT_FETCH_TIMEOUT,
};

#[cfg(test)]
mod tests;
