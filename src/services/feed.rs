//! Incremental pagination of the already-synced local track collection.
//!
//! `TrackFeed` is the windowed-loading state machine behind the infinite
//! scroll: it pulls one page at a time from the backend listing endpoint,
//! guards against overlapping requests, and halts (keeping what it has) on
//! the first failure. It is fully decoupled from the sync engine; a caller
//! bumps its own refresh token and calls `reset()` after a sync completes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::backend::{self, BackendClient};
use crate::error::Error;
use crate::models::tracks::{SortOrder, Track, TrackSort};

/// Windowed read access to the backend's track listing
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Fetch the half-open window `[start, end)`
    async fn fetch_window(
        &self,
        start: usize,
        end: usize,
        sort: TrackSort,
        order: SortOrder,
    ) -> Result<Vec<Track>, Error>;
}

/// Production source: the backend listing endpoint scoped to one user
pub struct BackendTrackSource {
    pub client: Arc<BackendClient>,
    pub user_id: i64,
}

#[async_trait]
impl TrackSource for BackendTrackSource {
    async fn fetch_window(
        &self,
        start: usize,
        end: usize,
        sort: TrackSort,
        order: SortOrder,
    ) -> Result<Vec<Track>, Error> {
        backend::tracks::fetch_tracks(&self.client, self.user_id, start, end, sort, order).await
    }
}

/// What a `load_more` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// One page was fetched and appended; carries the item count received
    Loaded(usize),
    /// A load was already in flight or the collection is exhausted
    Skipped,
}

#[derive(Default)]
struct FeedState {
    items: Vec<Track>,
    cursor: usize,
    has_more: bool,
    last_error: Option<String>,
}

/// Clears the loading flag on every exit path, error paths included
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Pagination state machine over a `TrackSource`.
///
/// At most one page request is in flight per feed instance: the atomic
/// loading flag is acquired before any request and concurrent `load_more`
/// calls return `Skipped` without touching the network.
pub struct TrackFeed {
    source: Arc<dyn TrackSource>,
    page_size: usize,
    sort: TrackSort,
    order: SortOrder,
    loading: AtomicBool,
    /// Bumped by `reset()`; a page response stamped with an older generation
    /// is discarded instead of appending into the cleared list
    generation: AtomicU64,
    state: Mutex<FeedState>,
}

impl TrackFeed {
    pub fn new(source: Arc<dyn TrackSource>, page_size: usize) -> Self {
        TrackFeed {
            source,
            page_size: page_size.max(1),
            sort: TrackSort::default(),
            order: SortOrder::default(),
            loading: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            state: Mutex::new(FeedState {
                has_more: true,
                ..FeedState::default()
            }),
        }
    }

    pub fn with_sort(mut self, sort: TrackSort, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    /// Load the next page.
    ///
    /// Skips without a request when a load is already in flight or the
    /// collection is exhausted. On success the cursor advances by the number
    /// of items actually received (a short page cannot make a retry skip or
    /// duplicate records) and a short page marks the collection exhausted.
    /// On failure pagination halts but already-loaded items are kept.
    pub async fn load_more(&self) -> Result<LoadOutcome, Error> {
        {
            let state = self.state.lock().expect("feed state poisoned");
            if !state.has_more {
                return Ok(LoadOutcome::Skipped);
            }
        }
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(LoadOutcome::Skipped);
        }
        let _guard = LoadingGuard(&self.loading);

        let generation = self.generation.load(Ordering::SeqCst);
        let start = self.state.lock().expect("feed state poisoned").cursor;
        let end = start + self.page_size;

        match self
            .source
            .fetch_window(start, end, self.sort, self.order)
            .await
        {
            Ok(page) => {
                let received = page.len();
                let mut state = self.state.lock().expect("feed state poisoned");
                if self.generation.load(Ordering::SeqCst) != generation {
                    // A reset cleared the feed while this page was in flight;
                    // its window belongs to the old cursor sequence
                    return Ok(LoadOutcome::Skipped);
                }
                state.cursor += received;
                if received < self.page_size {
                    state.has_more = false;
                }
                state.items.extend(page);
                Ok(LoadOutcome::Loaded(received))
            }
            Err(e) => {
                let mut state = self.state.lock().expect("feed state poisoned");
                if self.generation.load(Ordering::SeqCst) != generation {
                    log::debug!("stale feed page failed after reset, ignoring: {}", e);
                    return Ok(LoadOutcome::Skipped);
                }
                log::warn!("feed page load failed, halting pagination: {}", e);
                state.has_more = false;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop everything and load the first page again. Called when the
    /// upstream collection may have changed, e.g. after a sync completes.
    ///
    /// Bumps the feed generation so a page that was in flight when the reset
    /// happened cannot append its stale window into the cleared list.
    pub async fn reset(&self) -> Result<LoadOutcome, Error> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.state.lock().expect("feed state poisoned");
            state.items.clear();
            state.cursor = 0;
            state.has_more = true;
            state.last_error = None;
        }
        self.load_more().await
    }

    /// Viewport-proximity trigger: true when the visible window is within
    /// `lookahead` items of the end of what is loaded and a load would not
    /// be skipped
    pub fn should_load_ahead(&self, visible_end: usize, lookahead: usize) -> bool {
        if self.loading.load(Ordering::SeqCst) {
            return false;
        }
        let state = self.state.lock().expect("feed state poisoned");
        state.has_more && visible_end + lookahead >= state.items.len()
    }

    pub fn items(&self) -> Vec<Track> {
        self.state.lock().expect("feed state poisoned").items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("feed state poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().expect("feed state poisoned").has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Message from the failure that halted pagination, if any
    pub fn last_error(&self) -> Option<String> {
        self.state
            .lock()
            .expect("feed state poisoned")
            .last_error
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    fn track(n: usize) -> Track {
        Track {
            source_id: format!("trk{n}"),
            name: format!("Track {n}"),
            artists: "Someone".to_string(),
            album: "Album".to_string(),
            album_id: "alb".to_string(),
            duration_ms: 1000,
            explicit: false,
            popularity: 50,
            track_number: 1,
            release_date: "2020".to_string(),
            added_at: format!("2024-01-01T00:00:{:02}Z", n % 60),
            image: None,
            owner_id: 1,
        }
    }

    /// Serves a fixed total, slicing windows like the backend does
    struct FixedSource {
        total: usize,
        requests: AtomicUsize,
    }

    impl FixedSource {
        fn new(total: usize) -> Arc<Self> {
            Arc::new(FixedSource {
                total,
                requests: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TrackSource for FixedSource {
        async fn fetch_window(
            &self,
            start: usize,
            end: usize,
            _sort: TrackSort,
            _order: SortOrder,
        ) -> Result<Vec<Track>, Error> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let start = start.min(self.total);
            let end = end.min(self.total);
            Ok((start..end).map(track).collect())
        }
    }

    /// Fails every request
    struct BrokenSource;

    #[async_trait]
    impl TrackSource for BrokenSource {
        async fn fetch_window(
            &self,
            _start: usize,
            _end: usize,
            _sort: TrackSort,
            _order: SortOrder,
        ) -> Result<Vec<Track>, Error> {
            Err(Error::Backend {
                status: 500,
                message: "listing failed".to_string(),
            })
        }
    }

    /// Blocks inside the request until the test releases the gate
    struct GatedSource {
        calls: AtomicUsize,
        gate: Semaphore,
    }

    #[async_trait]
    impl TrackSource for GatedSource {
        async fn fetch_window(
            &self,
            _start: usize,
            _end: usize,
            _sort: TrackSort,
            _order: SortOrder,
        ) -> Result<Vec<Track>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self.gate.acquire().await.expect("gate closed");
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn two_pages_then_short_page_ends_feed() {
        // 25 items, page size 20: the spec's concrete scenario
        let source = FixedSource::new(25);
        let feed = TrackFeed::new(source.clone(), 20);

        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Loaded(20));
        assert!(feed.has_more());

        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Loaded(5));
        assert_eq!(feed.len(), 25);
        assert!(!feed.has_more());

        // Exhausted: no further request is issued
        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Skipped);
        assert_eq!(source.requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn full_drain_has_no_gaps_or_duplicates() {
        let source = FixedSource::new(47);
        let feed = TrackFeed::new(source.clone(), 10);

        while feed.has_more() {
            feed.load_more().await.unwrap();
        }

        let ids: Vec<String> = feed.items().iter().map(|t| t.source_id.clone()).collect();
        let expected: Vec<String> = (0..47).map(|n| format!("trk{n}")).collect();
        assert_eq!(ids, expected);
        // ceil(47 / 10) pages
        assert_eq!(source.requests.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn overlapping_loads_issue_one_request() {
        let source = Arc::new(GatedSource {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        });
        let feed = Arc::new(TrackFeed::new(source.clone(), 20));

        let background = {
            let feed = feed.clone();
            tokio::spawn(async move { feed.load_more().await })
        };

        // Wait for the first call to be inside the source
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(feed.is_loading());

        // Second call while the first is unresolved: skipped, no request
        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Skipped);

        source.gate.add_permits(1);
        background.await.unwrap().unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn failure_halts_pagination_but_keeps_items() {
        let source = FixedSource::new(40);
        let feed = TrackFeed::new(source, 20);
        feed.load_more().await.unwrap();
        assert_eq!(feed.len(), 20);

        // Swap in a failing source by building a feed around one directly
        let broken = TrackFeed::new(Arc::new(BrokenSource), 20);
        broken.load_more().await.unwrap_err();
        assert!(!broken.has_more());
        assert!(broken.last_error().unwrap().contains("listing failed"));
        assert_eq!(broken.len(), 0);
        assert!(!broken.is_loading());
    }

    #[tokio::test]
    async fn reset_reloads_from_the_top() {
        let source = FixedSource::new(5);
        let feed = TrackFeed::new(source.clone(), 20);

        feed.load_more().await.unwrap();
        assert!(!feed.has_more());
        assert_eq!(feed.len(), 5);

        assert_eq!(feed.reset().await.unwrap(), LoadOutcome::Loaded(5));
        assert_eq!(feed.len(), 5);
        assert!(!feed.has_more());
        assert!(feed.last_error().is_none());
    }

    #[tokio::test]
    async fn reset_during_flight_discards_the_stale_page() {
        /// Serves real windows, but blocks the first request on the gate
        struct GatedWindowSource {
            total: usize,
            calls: AtomicUsize,
            gate: Semaphore,
        }

        #[async_trait]
        impl TrackSource for GatedWindowSource {
            async fn fetch_window(
                &self,
                start: usize,
                end: usize,
                _sort: TrackSort,
                _order: SortOrder,
            ) -> Result<Vec<Track>, Error> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    let _permit = self.gate.acquire().await.expect("gate closed");
                }
                let start = start.min(self.total);
                let end = end.min(self.total);
                Ok((start..end).map(track).collect())
            }
        }

        let source = Arc::new(GatedWindowSource {
            total: 30,
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        });
        let feed = Arc::new(TrackFeed::new(source.clone(), 20));

        let in_flight = {
            let feed = feed.clone();
            tokio::spawn(async move { feed.load_more().await })
        };
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // Reset while the first page is unresolved: its own reload is
        // skipped by the loading guard, the cleared state stays cleared
        assert_eq!(feed.reset().await.unwrap(), LoadOutcome::Skipped);

        // The in-flight response resolves late and is discarded, not appended
        source.gate.add_permits(1);
        assert_eq!(in_flight.await.unwrap().unwrap(), LoadOutcome::Skipped);
        assert_eq!(feed.len(), 0);
        assert!(feed.has_more());

        // The next trigger loads page 0 of the new sequence as normal
        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Loaded(20));
        let ids: Vec<String> = feed.items().iter().map(|t| t.source_id.clone()).collect();
        let expected: Vec<String> = (0..20).map(|n| format!("trk{n}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn load_ahead_predicate_tracks_window_proximity() {
        let source = FixedSource::new(30);
        let feed = TrackFeed::new(source, 20);
        feed.load_more().await.unwrap();

        // 20 loaded: rendering item 10 with a lookahead of 5 is not close enough
        assert!(!feed.should_load_ahead(10, 5));
        // Rendering item 16 with lookahead 5 reaches past the end
        assert!(feed.should_load_ahead(16, 5));

        feed.load_more().await.unwrap();
        // Exhausted: never load ahead again
        assert!(!feed.should_load_ahead(29, 5));
    }
}
