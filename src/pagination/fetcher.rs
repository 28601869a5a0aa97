//! Incremental page fetcher
//!
//! [`PageFetcher`] loads one page at a time from a [`DataSource`], folds it
//! into the accumulated list and keeps redundant fetches from going out.
//!
//! Each load runs `Idle -> Fetching -> {folded | skipped on error} -> Idle`.
//! The guard check and the `fetching` flag are set under one lock, and the
//! lock is never held across the request, so concurrent triggers see a
//! consistent `fetching` flag and at most one request is outstanding.

use super::scope::FetchScope;
use super::types::{FetchOptions, LoadOutcome, PaginationState, RefreshPolicy, SkipReason};
use crate::error::FetchFailure;
use crate::source::DataSource;
use crate::types::{FetchParams, LoadMode, Page};
use crate::view::{FeedView, Trigger};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// State behind the fetcher's lock
#[derive(Debug)]
struct Inner {
    state: PaginationState,
    /// Identifies the outstanding fetch so a stale release cannot clear a newer one
    ticket: u64,
    /// A refresh collided with the outstanding fetch (queue policy only)
    pending_refresh: bool,
}

/// Raw result of one request, before folding
enum Fetched {
    Page(Page),
    Failed(FetchFailure),
    Cancelled,
}

/// Incremental offset/limit list loader
pub struct PageFetcher<S> {
    source: S,
    options: FetchOptions,
    scope: FetchScope,
    inner: Mutex<Inner>,
}

impl<S: DataSource> PageFetcher<S> {
    /// Create a fetcher with default options (page size 5)
    pub fn new(source: S) -> Self {
        Self::with_options(source, FetchOptions::default())
    }

    /// Create a fetcher with custom options. A zero `limit` is raised to 1.
    pub fn with_options(source: S, mut options: FetchOptions) -> Self {
        options.limit = options.limit.max(1);
        Self {
            inner: Mutex::new(Inner {
                state: PaginationState::new(options.limit),
                ticket: 0,
                pending_refresh: false,
            }),
            source,
            options,
            scope: FetchScope::new(),
        }
    }

    /// The data source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetcher options
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Handle to this feed's lifetime scope
    pub fn scope(&self) -> FetchScope {
        self.scope.clone()
    }

    /// Close the scope: the outstanding fetch is abandoned and later loads are skipped
    pub fn detach(&self) {
        info!("Feed detached");
        self.scope.detach();
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PaginationState {
        self.lock().state.clone()
    }

    /// Render snapshot for the hosting UI
    pub fn view(&self) -> FeedView {
        FeedView::from_state(&self.lock().state)
    }

    /// Start over from offset 0
    pub async fn refresh(&self) -> LoadOutcome {
        self.load(LoadMode::Refresh).await
    }

    /// Fetch the next page
    pub async fn load_more(&self) -> LoadOutcome {
        self.load(LoadMode::Append).await
    }

    /// React to a UI trigger
    pub async fn handle(&self, trigger: Trigger) -> LoadOutcome {
        debug!("Trigger {:?}", trigger);
        self.load(trigger.mode()).await
    }

    /// Refresh, then append until the end is reached, a load stops making
    /// progress, or `max_pages` pages have been loaded.
    ///
    /// An empty page below the server count (rows deleted between pages)
    /// leaves the offset where it was, so paging stops there.
    pub async fn load_all(&self, max_pages: Option<usize>) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        let mut mode = LoadMode::Refresh;

        while max_pages.map_or(true, |max| outcomes.len() < max) {
            let outcome = self.load(mode).await;
            let keep_going = outcome.has_more();
            if matches!(outcome, LoadOutcome::Loaded { received: 0, end_reached: false, .. }) {
                warn!("Empty page before the end; stopping");
            }
            outcomes.push(outcome);
            if !keep_going {
                break;
            }
            mode = LoadMode::Append;
        }

        outcomes
    }

    /// Load one page.
    ///
    /// No-op when a fetch is outstanding, when appending past the known end,
    /// or after detachment. Failures never propagate: they are recorded as
    /// `last_error` and reported in the outcome, leaving items and offset
    /// untouched.
    pub async fn load(&self, mode: LoadMode) -> LoadOutcome {
        let (ticket, mut params) = match self.begin(mode) {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };
        let _release = Release {
            inner: &self.inner,
            ticket,
        };

        let mut mode = mode;
        loop {
            let fetched = self.fetch(&params).await;
            let outcome = self.finish(mode, fetched);

            match self.take_queued_refresh(&outcome) {
                Some(next) => {
                    info!("Running queued refresh after {} fetch", mode);
                    mode = LoadMode::Refresh;
                    params = next;
                }
                None => return outcome,
            }
        }
    }

    /// Guard clauses, then mark the fetch as outstanding
    fn begin(&self, mode: LoadMode) -> Result<(u64, FetchParams), LoadOutcome> {
        let mut inner = self.lock();

        if inner.state.fetching {
            if mode == LoadMode::Refresh && self.options.refresh_policy == RefreshPolicy::Queue {
                debug!("Refresh queued behind in-flight fetch");
                inner.pending_refresh = true;
                return Err(LoadOutcome::Deferred);
            }
            debug!("Skipping {} load: fetch in flight", mode);
            return Err(LoadOutcome::skipped(SkipReason::InFlight));
        }
        if mode == LoadMode::Append && inner.state.end_reached {
            debug!("Skipping append: end reached at offset {}", inner.state.offset);
            return Err(LoadOutcome::skipped(SkipReason::EndReached));
        }
        if self.scope.is_detached() {
            return Err(LoadOutcome::skipped(SkipReason::Detached));
        }

        inner.state.fetching = true;
        inner.state.loading = Some(mode);
        inner.ticket += 1;

        let params = self.params_for(&inner.state, mode);
        debug!(
            "Fetching {} page: offset={} limit={}",
            mode, params.offset, params.limit
        );
        Ok((inner.ticket, params))
    }

    fn params_for(&self, state: &PaginationState, mode: LoadMode) -> FetchParams {
        FetchParams {
            offset: state.request_offset(mode),
            limit: self.options.limit,
            filter: self.options.filter.clone(),
        }
    }

    /// Issue the request, bounded by the timeout and the scope
    async fn fetch(&self, params: &FetchParams) -> Fetched {
        let timeout = self.options.fetch_timeout;
        let request = tokio::time::timeout(timeout, self.source.fetch_page(params));

        tokio::select! {
            biased;
            () = self.scope.detached() => Fetched::Cancelled,
            result = request => match result {
                Ok(Ok(page)) => Fetched::Page(page),
                Ok(Err(e)) => Fetched::Failed(FetchFailure::from(&e)),
                Err(_) => Fetched::Failed(FetchFailure::Timeout {
                    after_ms: timeout.as_millis() as u64,
                }),
            },
        }
    }

    /// Fold the result and clear the loading indicator
    fn finish(&self, mode: LoadMode, fetched: Fetched) -> LoadOutcome {
        let mut inner = self.lock();
        inner.state.loading = None;

        if self.scope.is_detached() {
            debug!("Dropping {} response: feed detached", mode);
            return LoadOutcome::Cancelled;
        }

        match fetched {
            Fetched::Page(page) => {
                let received = page.len();
                let count = page.count;
                let total = inner.state.fold(mode, page);
                debug!(
                    "Folded {} page: received={} total={} server_count={} end_reached={}",
                    mode, received, total, count, inner.state.end_reached
                );
                LoadOutcome::Loaded {
                    mode,
                    received,
                    total,
                    end_reached: inner.state.end_reached,
                }
            }
            Fetched::Failed(failure) => {
                warn!(
                    "{} fetch failed ({}): {}",
                    mode,
                    failure.label(),
                    failure
                );
                inner.state.last_error = Some(failure.clone());
                LoadOutcome::Failed { failure }
            }
            Fetched::Cancelled => LoadOutcome::Cancelled,
        }
    }

    /// Consume a queued refresh, keeping the fetch slot held for it
    fn take_queued_refresh(&self, outcome: &LoadOutcome) -> Option<FetchParams> {
        let mut inner = self.lock();
        if !std::mem::take(&mut inner.pending_refresh) {
            return None;
        }
        if matches!(outcome, LoadOutcome::Cancelled) || self.scope.is_detached() {
            return None;
        }

        inner.state.loading = Some(LoadMode::Refresh);
        Some(self.params_for(&inner.state, LoadMode::Refresh))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves the state consistent, so a panic
        // elsewhere does not invalidate it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> std::fmt::Debug for PageFetcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("options", &self.options)
            .field("detached", &self.scope.is_detached())
            .finish_non_exhaustive()
    }
}

/// Clears `fetching` when a load ends, including when its future is dropped
struct Release<'a> {
    inner: &'a Mutex<Inner>,
    ticket: u64,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.ticket == self.ticket {
            inner.state.fetching = false;
            inner.state.loading = None;
            inner.pending_refresh = false;
        }
    }
}
