//! Search session: per-query aggregation, pagination, and state broadcast.
//!
//! A [`SearchSession`] owns the accumulated results for the current query
//! and publishes [`SearchState`] through a `watch` channel, so observers
//! always see the latest state, never a reordered one. Each fetch runs on
//! its own task and carries the generation it was dispatched under; a
//! completion whose generation no longer matches is stale (its query was
//! superseded) and is dropped without touching the aggregation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{self, SearchBackend};
use crate::pager::Pager;
use crate::{Config, MovieSummary, SearchState};

struct Shared {
    query: String,
    items: Vec<MovieSummary>,
    pager: Pager,
    /// Bumped on every page-1 request. In-flight fetches from before the
    /// bump fail the generation check on completion.
    generation: u64,
    state: watch::Sender<SearchState>,
}

/// Drives paged title searches against a [`SearchBackend`] and aggregates
/// the results for one query at a time.
pub struct SearchSession {
    backend: Arc<dyn SearchBackend>,
    client: reqwest::Client,
    timeout: Duration,
    shared: Arc<Mutex<Shared>>,
    cancel: CancellationToken,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn SearchBackend>, config: &Config) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            backend,
            client: api::build_client(),
            timeout: config.timeout(),
            shared: Arc::new(Mutex::new(Shared {
                query: String::new(),
                items: Vec::new(),
                pager: Pager::new(),
                generation: 0,
                state,
            })),
            cancel: CancellationToken::new(),
        }
    }

    /// Observe state transitions. The receiver always yields the latest
    /// state; intermediate states may be skipped under load.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.lock().unwrap().state.subscribe()
    }

    /// The latest published state.
    pub fn state(&self) -> SearchState {
        self.shared.lock().unwrap().state.borrow().clone()
    }

    pub fn current_query(&self) -> String {
        self.shared.lock().unwrap().query.clone()
    }

    /// Snapshot of the pagination bookkeeping.
    pub fn pager(&self) -> Pager {
        self.shared.lock().unwrap().pager
    }

    /// Submit a query; requests page 1.
    pub fn submit(&self, query: &str) {
        self.request(query, 1);
    }

    /// Re-request page 1 for the current query. The aggregation is kept on
    /// screen until the fresh page arrives and replaces it. No-op before
    /// the first query.
    pub fn refresh(&self) {
        let query = self.shared.lock().unwrap().query.clone();
        if query.is_empty() {
            return;
        }
        self.request(&query, 1);
    }

    /// The view reports that the user scrolled near the end of the list.
    /// Requests the next page unless a fetch is in flight or the last page
    /// has been reached.
    pub fn scroll_near_end(&self) {
        let (query, page, generation) = {
            let mut shared = self.shared.lock().unwrap();
            if shared.query.is_empty() || !shared.pager.should_load_more() {
                return;
            }
            shared.pager.begin_load();
            (
                shared.query.clone(),
                shared.pager.next_page(),
                shared.generation,
            )
        };
        self.dispatch(query, page, generation);
    }

    /// Request one page. A page-1 request for a new query clears the
    /// aggregation and emits `InProgress` before the fetch is dispatched;
    /// any page-1 request supersedes fetches still in flight. The fetch is
    /// always issued; failures are not retried.
    pub fn request(&self, query: &str, page: u32) {
        let generation = {
            let mut shared = self.shared.lock().unwrap();
            if page == 1 {
                shared.generation += 1;
                shared.pager.reset();
                if query != shared.query {
                    shared.items.clear();
                    shared.query = query.to_string();
                    shared.state.send_replace(SearchState::InProgress);
                }
            }
            shared.pager.begin_load();
            shared.generation
        };
        self.dispatch(query.to_string(), page, generation);
    }

    fn dispatch(&self, query: String, page: u32, generation: u64) {
        let backend = Arc::clone(&self.backend);
        let client = self.client.clone();
        let timeout = self.timeout;
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return,
                outcome = backend.search(&query, page, &client, timeout) => outcome,
            };

            let mut shared = shared.lock().unwrap();
            if shared.generation != generation {
                tracing::debug!(query = %query, page, "discarding stale result page");
                return;
            }

            match outcome {
                Ok(result) => {
                    if page == 1 {
                        // Fresh first page replaces whatever a refresh kept
                        // on screen.
                        shared.items.clear();
                    }
                    shared.items.extend(result.items);
                    shared.pager.page_loaded(page);
                    if shared.items.len() as u32 >= result.total_results {
                        shared.pager.mark_last_page();
                    }
                    let state = SearchState::Loaded {
                        items: shared.items.clone(),
                        total_results: result.total_results,
                    };
                    shared.state.send_replace(state);
                }
                Err(err) => {
                    tracing::warn!(query = %query, page, error = %err, "search failed");
                    shared.pager.finish_load();
                    shared.state.send_replace(SearchState::Error);
                }
            }
        });
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockBackend, MockResponse};
    use std::ops::Range;

    fn movie(n: usize) -> MovieSummary {
        MovieSummary {
            imdb_id: format!("tt{:07}", n),
            title: format!("Interview {}", n),
            year: "2014".into(),
            kind: "movie".into(),
            poster: None,
        }
    }

    fn movies(range: Range<usize>) -> Vec<MovieSummary> {
        range.map(movie).collect()
    }

    fn page(range: Range<usize>, total_results: u32) -> MockResponse {
        MockResponse::Page {
            items: movies(range),
            total_results,
        }
    }

    /// Wait for the next settled (`Loaded` or `Error`) state after the
    /// receiver's last seen version.
    async fn next_settled(rx: &mut watch::Receiver<SearchState>) -> SearchState {
        loop {
            rx.changed().await.expect("session dropped");
            let state = rx.borrow_and_update().clone();
            if state.is_settled() {
                return state;
            }
        }
    }

    #[tokio::test]
    async fn aggregates_sequential_pages_in_arrival_order() {
        let backend = Arc::new(MockBackend::with_sequence(vec![
            page(0..10, 25),
            page(10..20, 25),
            page(20..25, 25),
        ]));
        let session = SearchSession::new(backend.clone(), &Config::default());
        let mut rx = session.subscribe();

        session.submit("Interview");
        let state = next_settled(&mut rx).await;
        assert_eq!(
            state,
            SearchState::Loaded {
                items: movies(0..10),
                total_results: 25
            }
        );
        assert_eq!(session.pager().current_page(), 1);
        assert!(!session.pager().is_last_page());

        session.scroll_near_end();
        let state = next_settled(&mut rx).await;
        assert_eq!(
            state,
            SearchState::Loaded {
                items: movies(0..20),
                total_results: 25
            }
        );
        assert!(!session.pager().is_last_page());

        session.scroll_near_end();
        let state = next_settled(&mut rx).await;
        assert_eq!(
            state,
            SearchState::Loaded {
                items: movies(0..25),
                total_results: 25
            }
        );
        assert!(session.pager().is_last_page());

        // All results fetched: further scroll events issue no request.
        session.scroll_near_end();
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn scroll_while_loading_issues_no_request() {
        let backend = Arc::new(
            MockBackend::with_sequence(vec![page(0..10, 25), page(10..20, 25)])
                .with_delay(Duration::from_millis(20)),
        );
        let session = SearchSession::new(backend.clone(), &Config::default());
        let mut rx = session.subscribe();

        session.submit("Interview");
        // Page 1 is still in flight; the gate swallows this event.
        session.scroll_near_end();
        let _ = next_settled(&mut rx).await;
        assert_eq!(backend.call_count(), 1);

        session.scroll_near_end();
        let _ = next_settled(&mut rx).await;
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn new_query_clears_aggregation_before_dispatch() {
        let backend = Arc::new(MockBackend::with_sequence(vec![
            page(0..10, 25),
            page(10..20, 25),
            page(30..33, 3),
        ]));
        let session = SearchSession::new(backend, &Config::default());
        let mut rx = session.subscribe();

        session.submit("first");
        let _ = next_settled(&mut rx).await;
        session.scroll_near_end();
        let _ = next_settled(&mut rx).await;

        session.submit("second");
        // The reset happens synchronously, before the fetch lands.
        assert_eq!(session.state(), SearchState::InProgress);
        assert_eq!(session.current_query(), "second");

        let state = next_settled(&mut rx).await;
        assert_eq!(
            state,
            SearchState::Loaded {
                items: movies(30..33),
                total_results: 3
            }
        );
        assert!(session.pager().is_last_page());
    }

    #[tokio::test]
    async fn failure_emits_error_and_leaves_aggregation_empty() {
        let backend = Arc::new(MockBackend::with_sequence(vec![
            MockResponse::Error("HTTP 500".into()),
            page(0..10, 25),
        ]));
        let session = SearchSession::new(backend.clone(), &Config::default());
        let mut rx = session.subscribe();

        session.submit("Interview");
        assert_eq!(next_settled(&mut rx).await, SearchState::Error);
        assert_eq!(session.pager().current_page(), 0);
        assert!(!session.pager().is_loading());

        // Not retried automatically; a manual refresh re-requests page 1.
        assert_eq!(backend.call_count(), 1);
        session.refresh();
        let state = next_settled(&mut rx).await;
        assert_eq!(
            state,
            SearchState::Loaded {
                items: movies(0..10),
                total_results: 25
            }
        );
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn refresh_replaces_aggregation_with_fresh_first_page() {
        let backend = Arc::new(MockBackend::with_sequence(vec![
            page(0..10, 25),
            page(10..20, 25),
            page(0..10, 25),
        ]));
        let session = SearchSession::new(backend, &Config::default());
        let mut rx = session.subscribe();

        session.submit("Interview");
        let _ = next_settled(&mut rx).await;
        session.scroll_near_end();
        let _ = next_settled(&mut rx).await;

        session.refresh();
        let state = next_settled(&mut rx).await;
        assert_eq!(
            state,
            SearchState::Loaded {
                items: movies(0..10),
                total_results: 25
            }
        );
        assert_eq!(session.pager().current_page(), 1);
        assert!(!session.pager().is_last_page());
    }

    #[tokio::test]
    async fn refresh_before_any_query_is_a_no_op() {
        let backend = Arc::new(MockBackend::new(page(0..10, 25)));
        let session = SearchSession::new(backend.clone(), &Config::default());

        session.refresh();
        session.scroll_near_end();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(backend.call_count(), 0);
        assert_eq!(session.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn stale_page_for_superseded_query_is_discarded() {
        let backend = Arc::new(
            MockBackend::with_sequence(vec![page(0..10, 25), page(40..42, 2)])
                .with_delay(Duration::from_millis(20)),
        );
        let session = SearchSession::new(backend, &Config::default());
        let mut rx = session.subscribe();

        session.submit("first");
        session.submit("second");

        let expected = SearchState::Loaded {
            items: movies(40..42),
            total_results: 2,
        };
        assert_eq!(next_settled(&mut rx).await, expected);

        // Give the superseded fetch time to land; it must not be applied.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(session.state(), expected);
        assert_eq!(session.current_query(), "second");
    }
}
