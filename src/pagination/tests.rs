//! Tests for pagination module

use super::*;
use crate::error::{Error, FetchFailure, Result};
use crate::source::{DataSource, StaticSource};
use crate::types::{FetchParams, Item, ItemId, LoadMode, Page};
use crate::view::Trigger;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_test::{assert_pending, assert_ready, assert_ready_eq};

// ============================================================================
// Scripted Source
// ============================================================================

/// Replays scripted responses and records every request
#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Page>>>,
    calls: Mutex<Vec<FetchParams>>,
    gate: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    fn new() -> Self {
        Self::default()
    }

    /// Requests block until a permit is added to the returned semaphore
    fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let source = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (source, gate)
    }

    fn page(self, first_id: i64, len: usize, count: u64) -> Self {
        let rows = (first_id..first_id + len as i64).map(Item::new).collect();
        self.respond(Ok(Page::new(rows, count)))
    }

    fn fail(self, error: Error) -> Self {
        self.respond(Err(error))
    }

    fn respond(self, response: Result<Page>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    fn calls(&self) -> Vec<FetchParams> {
        self.calls.lock().unwrap().clone()
    }

    fn call_offsets(&self) -> Vec<u64> {
        self.calls().iter().map(|p| p.offset).collect()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn fetch_page(&self, params: &FetchParams) -> Result<Page> {
        self.calls.lock().unwrap().push(params.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(ref gate) = self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other("no scripted response".into())))
    }
}

fn fetcher(source: ScriptedSource) -> PageFetcher<ScriptedSource> {
    PageFetcher::new(source)
}

fn ids(state: &PaginationState) -> Vec<String> {
    state.accumulated.iter().map(Item::key).collect()
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::default();
    assert_eq!(state.offset, 0);
    assert_eq!(state.limit, 5);
    assert!(state.is_empty());
    assert!(!state.end_reached);
    assert!(!state.fetching);
    assert!(state.loading.is_none());
    assert!(state.last_error.is_none());
}

#[test]
fn test_request_offset() {
    let mut state = PaginationState::new(5);
    state.offset = 10;
    assert_eq!(state.request_offset(LoadMode::Refresh), 0);
    assert_eq!(state.request_offset(LoadMode::Append), 10);
}

#[test]
fn test_fold_reaches_end_at_server_count() {
    let mut state = PaginationState::new(5);
    let page = |first: i64, len: i64| Page::new((first..first + len).map(Item::new).collect(), 12);

    assert_eq!(state.fold(LoadMode::Refresh, page(1, 5)), 5);
    assert!(!state.end_reached);
    assert_eq!(state.fold(LoadMode::Append, page(6, 5)), 10);
    assert!(!state.end_reached);
    assert_eq!(state.fold(LoadMode::Append, page(11, 2)), 12);
    assert!(state.end_reached);
    assert_eq!(state.offset, 12);
}

#[test]
fn test_fold_refresh_replaces_and_clears_error() {
    let mut state = PaginationState::new(5);
    state.accumulated = (1..=9).map(Item::new).collect();
    state.offset = 9;
    state.end_reached = true;
    state.last_error = Some(FetchFailure::Timeout { after_ms: 5 });

    state.fold(LoadMode::Refresh, Page::new(vec![Item::new(100)], 30));

    assert_eq!(ids(&state), vec!["100"]);
    assert_eq!(state.offset, 1);
    assert!(!state.end_reached);
    assert!(state.last_error.is_none());
    assert!(state.last_fetched_at.is_some());
}

#[test]
fn test_fetch_options_builder() {
    let options = FetchOptions::new(20)
        .with_filter(9)
        .with_timeout(Duration::from_secs(2))
        .with_refresh_policy(RefreshPolicy::Queue);

    assert_eq!(options.limit, 20);
    assert_eq!(options.filter, Some(ItemId::Int(9)));
    assert_eq!(options.fetch_timeout, Duration::from_secs(2));
    assert_eq!(options.refresh_policy, RefreshPolicy::Queue);
    assert_eq!(FetchOptions::default().fetch_timeout, DEFAULT_FETCH_TIMEOUT);
}

// ============================================================================
// PageFetcher Tests
// ============================================================================

#[tokio::test]
async fn test_refresh_then_appends_until_end() {
    let source = ScriptedSource::new()
        .page(1, 5, 12)
        .page(6, 5, 12)
        .page(11, 2, 12);
    let fetcher = fetcher(source);

    let outcome = fetcher.refresh().await;
    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            mode: LoadMode::Refresh,
            received: 5,
            total: 5,
            end_reached: false
        }
    );
    let state = fetcher.snapshot();
    assert_eq!((state.len(), state.offset, state.end_reached), (5, 5, false));

    fetcher.load_more().await;
    let state = fetcher.snapshot();
    assert_eq!((state.len(), state.offset, state.end_reached), (10, 10, false));

    fetcher.load_more().await;
    let state = fetcher.snapshot();
    assert_eq!((state.len(), state.offset, state.end_reached), (12, 12, true));
    assert!(!state.fetching);

    assert_eq!(fetcher.source().call_offsets(), vec![0, 5, 10]);
    assert!(fetcher.source().calls().iter().all(|p| p.limit == 5));
}

#[tokio::test]
async fn test_append_after_end_is_noop() {
    let fetcher = fetcher(ScriptedSource::new().page(1, 3, 3));
    fetcher.refresh().await;
    let before = fetcher.snapshot();
    assert!(before.end_reached);

    let outcome = fetcher.load_more().await;

    assert_eq!(outcome, LoadOutcome::skipped(SkipReason::EndReached));
    assert_eq!(fetcher.snapshot(), before);
    assert_eq!(fetcher.source().calls().len(), 1);
}

#[tokio::test]
async fn test_refresh_ignores_end_reached() {
    let fetcher = fetcher(ScriptedSource::new().page(1, 3, 3).page(50, 5, 20));
    fetcher.refresh().await;
    assert!(fetcher.snapshot().end_reached);

    fetcher.refresh().await;

    let state = fetcher.snapshot();
    assert_eq!(ids(&state), vec!["50", "51", "52", "53", "54"]);
    assert_eq!(state.offset, 5);
    assert!(!state.end_reached);
    assert_eq!(fetcher.source().call_offsets(), vec![0, 0]);
}

#[tokio::test]
async fn test_second_append_while_in_flight_is_skipped() {
    let (source, gate) = ScriptedSource::gated();
    let fetcher = fetcher(source.page(1, 5, 20));

    let (first, second, ()) = tokio::join!(fetcher.load_more(), fetcher.load_more(), async {
        tokio::task::yield_now().await;
        gate.add_permits(1);
    });

    assert!(first.is_loaded());
    assert_eq!(second, LoadOutcome::skipped(SkipReason::InFlight));
    assert_eq!(fetcher.source().calls().len(), 1);
    assert_eq!(fetcher.snapshot().len(), 5);
}

#[tokio::test]
async fn test_in_flight_load_stays_pending_until_source_answers() {
    let (source, gate) = ScriptedSource::gated();
    let fetcher = fetcher(source.page(1, 5, 20));

    let mut first = tokio_test::task::spawn(fetcher.load_more());
    assert_pending!(first.poll());
    assert!(fetcher.snapshot().fetching);

    let mut second = tokio_test::task::spawn(fetcher.load_more());
    assert_ready_eq!(second.poll(), LoadOutcome::skipped(SkipReason::InFlight));

    gate.add_permits(1);
    assert!(first.is_woken());
    assert!(assert_ready!(first.poll()).is_loaded());
    assert_eq!(fetcher.source().calls().len(), 1);
    assert!(!fetcher.snapshot().fetching);
}

#[tokio::test]
async fn test_at_most_one_request_pending() {
    let (source, gate) = ScriptedSource::gated();
    let source = source.page(1, 5, 50).page(6, 5, 50);
    let fetcher = Arc::new(fetcher(source));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let fetcher = fetcher.clone();
        tasks.push(tokio::spawn(async move { fetcher.load_more().await }));
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.add_permits(8);

    let loaded = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter(|outcome| outcome.as_ref().unwrap().is_loaded())
        .count();

    assert_eq!(loaded, 1);
    assert_eq!(fetcher.source().max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(fetcher.source().calls().len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_leaves_state_unchanged() {
    let source = ScriptedSource::new()
        .page(1, 5, 12)
        .fail(Error::http_status(503, "unavailable"));
    let fetcher = fetcher(source);
    fetcher.refresh().await;
    let before = fetcher.snapshot();

    let outcome = fetcher.load_more().await;

    assert_eq!(outcome.failure(), Some(&FetchFailure::Status { status: 503 }));
    let after = fetcher.snapshot();
    assert_eq!(after.accumulated, before.accumulated);
    assert_eq!(after.offset, before.offset);
    assert_eq!(after.end_reached, before.end_reached);
    assert!(!after.fetching);
    assert!(after.loading.is_none());
    assert_eq!(after.last_error, Some(FetchFailure::Status { status: 503 }));
}

#[tokio::test]
async fn test_malformed_response_is_recorded() {
    let fetcher = fetcher(ScriptedSource::new().fail(Error::malformed("no rows")));

    let outcome = fetcher.refresh().await;

    assert_eq!(outcome.failure().map(FetchFailure::label), Some("malformed"));
    let state = fetcher.snapshot();
    assert!(state.is_empty());
    assert!(!state.fetching);
    assert_eq!(fetcher.view().last_error, state.last_error);
}

#[tokio::test]
async fn test_success_after_failure_clears_error() {
    let source = ScriptedSource::new()
        .fail(Error::Other("offline".into()))
        .page(1, 2, 2);
    let fetcher = fetcher(source);

    assert!(fetcher.refresh().await.failure().is_some());
    assert!(fetcher.snapshot().last_error.is_some());

    assert!(fetcher.refresh().await.is_loaded());
    assert!(fetcher.snapshot().last_error.is_none());
}

#[tokio::test]
async fn test_hung_fetch_times_out_and_releases_guard() {
    let (source, gate) = ScriptedSource::gated();
    let source = source.page(1, 5, 5);
    let options = FetchOptions::default().with_timeout(Duration::from_millis(30));
    let fetcher = PageFetcher::with_options(source, options);

    let outcome = fetcher.refresh().await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed {
            failure: FetchFailure::Timeout { after_ms: 30 }
        }
    );
    assert!(!fetcher.snapshot().fetching);

    gate.add_permits(1);
    assert!(fetcher.refresh().await.is_loaded());
    assert_eq!(fetcher.source().calls().len(), 2);
}

#[tokio::test]
async fn test_dropped_load_releases_guard() {
    let (source, gate) = ScriptedSource::gated();
    let fetcher = fetcher(source.page(1, 5, 10));

    let abandoned = tokio::time::timeout(Duration::from_millis(20), fetcher.refresh()).await;
    assert!(abandoned.is_err());

    let state = fetcher.snapshot();
    assert!(!state.fetching);
    assert!(state.loading.is_none());

    gate.add_permits(1);
    assert!(fetcher.refresh().await.is_loaded());
}

#[tokio::test]
async fn test_detach_cancels_in_flight_fetch() {
    let (source, _gate) = ScriptedSource::gated();
    let fetcher = fetcher(source.page(1, 5, 10));

    let (outcome, ()) = tokio::join!(fetcher.refresh(), async {
        tokio::task::yield_now().await;
        fetcher.detach();
    });

    assert_eq!(outcome, LoadOutcome::Cancelled);
    let state = fetcher.snapshot();
    assert!(state.is_empty());
    assert!(!state.fetching);

    assert_eq!(
        fetcher.load_more().await,
        LoadOutcome::skipped(SkipReason::Detached)
    );
    assert_eq!(fetcher.source().calls().len(), 1);
    assert!(fetcher.scope().is_detached());
}

#[tokio::test]
async fn test_view_tracks_loading_kind() {
    let (source, gate) = ScriptedSource::gated();
    let fetcher = fetcher(source.page(1, 5, 10).page(6, 5, 10));
    gate.add_permits(1);
    fetcher.refresh().await;

    let (_, during) = tokio::join!(fetcher.load_more(), async {
        tokio::task::yield_now().await;
        let view = fetcher.view();
        gate.add_permits(1);
        view
    });

    assert!(during.shows_footer_spinner());
    assert_eq!(during.items.len(), 5);
    assert_eq!(fetcher.view().loading, None);
    assert_eq!(fetcher.view().items.len(), 10);
}

#[tokio::test]
async fn test_refresh_during_append_is_dropped_by_default() {
    let (source, gate) = ScriptedSource::gated();
    let fetcher = fetcher(source.page(1, 5, 10));

    let (append, refresh, ()) = tokio::join!(fetcher.load_more(), fetcher.refresh(), async {
        tokio::task::yield_now().await;
        gate.add_permits(1);
    });

    assert!(append.is_loaded());
    assert_eq!(refresh, LoadOutcome::skipped(SkipReason::InFlight));
    assert_eq!(fetcher.source().calls().len(), 1);
}

#[tokio::test]
async fn test_queued_refresh_runs_after_in_flight_fetch() {
    let (source, gate) = ScriptedSource::gated();
    let source = source.page(1, 5, 20).page(6, 5, 20).page(100, 3, 3);
    let options = FetchOptions::default().with_refresh_policy(RefreshPolicy::Queue);
    let fetcher = PageFetcher::with_options(source, options);
    gate.add_permits(1);
    fetcher.refresh().await;

    let (append, refresh, ()) = tokio::join!(fetcher.load_more(), fetcher.refresh(), async {
        tokio::task::yield_now().await;
        gate.add_permits(2);
    });

    assert_eq!(refresh, LoadOutcome::Deferred);
    assert_eq!(
        append,
        LoadOutcome::Loaded {
            mode: LoadMode::Refresh,
            received: 3,
            total: 3,
            end_reached: true
        }
    );
    assert_eq!(fetcher.source().call_offsets(), vec![0, 5, 0]);
    let state = fetcher.snapshot();
    assert_eq!(ids(&state), vec!["100", "101", "102"]);
    assert!(!state.fetching);
}

#[tokio::test]
async fn test_filter_is_passed_to_source() {
    let options = FetchOptions::new(3).with_filter(42);
    let fetcher = PageFetcher::with_options(ScriptedSource::new().page(1, 3, 3), options);

    fetcher.refresh().await;

    let calls = fetcher.source().calls();
    assert_eq!(calls, vec![FetchParams::new(0, 3).with_filter(42)]);
}

#[tokio::test]
async fn test_handle_triggers() {
    let fetcher = PageFetcher::new(StaticSource::numbered(7));

    fetcher.handle(Trigger::ScreenActivated).await;
    assert_eq!(fetcher.snapshot().len(), 5);

    fetcher.handle(Trigger::ScrolledNearEnd).await;
    assert_eq!(fetcher.snapshot().len(), 7);
    assert!(fetcher.snapshot().end_reached);

    fetcher.handle(Trigger::PullToRefresh).await;
    assert_eq!(fetcher.snapshot().len(), 5);
}

#[tokio::test]
async fn test_load_all_stops_at_end() {
    let fetcher = PageFetcher::new(StaticSource::numbered(12));

    let outcomes = fetcher.load_all(None).await;

    assert_eq!(outcomes.len(), 3);
    let state = fetcher.snapshot();
    assert_eq!(state.len(), 12);
    assert!(state.end_reached);
}

#[tokio::test]
async fn test_load_all_respects_page_budget() {
    let fetcher = PageFetcher::new(StaticSource::numbered(40));

    let outcomes = fetcher.load_all(Some(2)).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(fetcher.snapshot().len(), 10);
    assert!(!fetcher.snapshot().end_reached);
}

#[tokio::test]
async fn test_load_all_stops_on_failure() {
    let source = ScriptedSource::new()
        .page(1, 5, 20)
        .fail(Error::Other("offline".into()));
    let fetcher = fetcher(source);

    let outcomes = fetcher.load_all(None).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[1].failure().is_some());
}

#[tokio::test]
async fn test_load_all_stops_on_empty_page_below_count() {
    // Rows deleted server-side: the count still promises 12 but the next page is empty
    let source = ScriptedSource::new().page(1, 3, 12).page(4, 0, 12);
    let fetcher = fetcher(source);

    let outcomes = tokio::time::timeout(Duration::from_secs(1), fetcher.load_all(None))
        .await
        .expect("paging stalled on an empty page");

    assert_eq!(outcomes.len(), 2);
    assert!(!outcomes[1].has_more());
    assert_eq!(fetcher.source().call_offsets(), vec![0, 3]);
    let state = fetcher.snapshot();
    assert_eq!((state.len(), state.offset, state.end_reached), (3, 3, false));
    assert!(state.last_error.is_none());
}

#[test]
fn test_has_more() {
    let loaded = |received, end_reached| LoadOutcome::Loaded {
        mode: LoadMode::Append,
        received,
        total: 5,
        end_reached,
    };
    assert!(loaded(5, false).has_more());
    assert!(!loaded(5, true).has_more());
    assert!(!loaded(0, false).has_more());
    assert!(!LoadOutcome::Deferred.has_more());
}

#[tokio::test]
async fn test_zero_limit_is_raised_to_one() {
    let fetcher = PageFetcher::with_options(
        StaticSource::numbered(3),
        FetchOptions {
            limit: 0,
            ..FetchOptions::default()
        },
    );
    assert_eq!(fetcher.options().limit, 1);
    assert_eq!(FetchOptions::new(0).limit, 1);

    let outcomes = fetcher.load_all(None).await;

    assert_eq!(outcomes.len(), 3);
    assert!(fetcher.snapshot().end_reached);
}
