//! Pagination state and load outcomes
//!
//! Defines the state folded by [`super::PageFetcher`] and what a single
//! `load` call reports back.

use crate::error::FetchFailure;
use crate::types::{Item, ItemId, LoadMode, Page, DEFAULT_PAGE_SIZE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upper bound for one page fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// What to do with a refresh that arrives while a fetch is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Drop it; the caller re-triggers if it still wants one
    #[default]
    Drop,
    /// Remember one refresh and run it as soon as the in-flight fetch folds
    Queue,
}

/// Fixed options of a fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Page size sent as `limit`
    pub limit: u32,
    /// Scope passed through to the data source
    pub filter: Option<ItemId>,
    /// Upper bound for one fetch, after which it counts as failed
    pub fetch_timeout: Duration,
    /// Handling of refreshes that collide with an in-flight fetch
    pub refresh_policy: RefreshPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            filter: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            refresh_policy: RefreshPolicy::Drop,
        }
    }
}

impl FetchOptions {
    /// Create options with the given page size (at least 1)
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..Default::default()
        }
    }

    /// Restrict fetches to a filter value
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<ItemId>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the per-fetch timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the refresh collision policy
    #[must_use]
    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }
}

/// Offset/limit pagination state of one feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationState {
    /// Offset of the next append request
    pub offset: u64,
    /// Page size
    pub limit: u32,
    /// Items folded so far, in server order
    pub accumulated: Vec<Item>,
    /// The server has no items past `offset`
    pub end_reached: bool,
    /// A request is outstanding
    pub fetching: bool,
    /// Kind of the outstanding request, for indicator selection
    pub loading: Option<LoadMode>,
    /// Failure of the most recent fetch, cleared by the next success
    pub last_error: Option<FetchFailure>,
    /// When the last page was folded
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl PaginationState {
    /// Create an empty state with the given page size
    pub fn new(limit: u32) -> Self {
        Self {
            offset: 0,
            limit,
            accumulated: Vec::new(),
            end_reached: false,
            fetching: false,
            loading: None,
            last_error: None,
            last_fetched_at: None,
        }
    }

    /// Offset to request for the given mode
    pub fn request_offset(&self, mode: LoadMode) -> u64 {
        match mode {
            LoadMode::Refresh => 0,
            LoadMode::Append => self.offset,
        }
    }

    /// Fold a fetched page into the state. Returns the number of items now held.
    pub fn fold(&mut self, mode: LoadMode, page: Page) -> usize {
        match mode {
            LoadMode::Refresh => self.accumulated = page.rows,
            LoadMode::Append => self.accumulated.extend(page.rows),
        }

        let new_offset = self.accumulated.len() as u64;
        self.end_reached = new_offset >= page.count;
        self.offset = new_offset;
        self.last_error = None;
        self.last_fetched_at = Some(Utc::now());
        self.accumulated.len()
    }

    /// Number of items held
    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    /// Whether no items are held
    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Why a load did not issue a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another fetch is outstanding
    InFlight,
    /// Append requested past the known end
    EndReached,
    /// The feed's scope was closed
    Detached,
}

/// Result of a single `load` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// A page was fetched and folded
    Loaded {
        mode: LoadMode,
        received: usize,
        total: usize,
        end_reached: bool,
    },
    /// No request was issued
    Skipped { reason: SkipReason },
    /// A refresh was queued behind the in-flight fetch
    Deferred,
    /// The fetch failed; state is unchanged apart from `last_error`
    Failed { failure: FetchFailure },
    /// The scope closed while the fetch was outstanding
    Cancelled,
}

impl LoadOutcome {
    pub(crate) fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// Whether a page was folded
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Whether another append can make progress: a non-empty page was
    /// folded and the end is not reached yet
    pub fn has_more(&self) -> bool {
        matches!(self, Self::Loaded { received, end_reached: false, .. } if *received > 0)
    }

    /// Whether the load was a no-op
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// The failure, if the fetch failed
    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}
