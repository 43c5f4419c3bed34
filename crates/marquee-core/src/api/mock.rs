//! Scriptable backend double for session and loader tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{SearchBackend, SearchPage};
use crate::{Error, MovieDetail, MovieSummary};

/// Scripted outcome for one `search()` call.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// One successfully fetched result page.
    Page {
        items: Vec<MovieSummary>,
        total_results: u32,
    },
    /// A failed fetch.
    Error(String),
}

/// A [`SearchBackend`] that plays back a script of responses.
///
/// Each search call consumes the next queued response; once only one entry
/// remains it is replayed for every further call. Latency is opt-in via
/// [`with_delay`](MockBackend::with_delay), and search calls are counted so
/// tests can assert how many requests actually went out.
pub struct MockBackend {
    script: Mutex<VecDeque<MockResponse>>,
    delay: Option<Duration>,
    searches: AtomicUsize,
    detail: Option<MovieDetail>,
}

impl MockBackend {
    /// A mock that answers every search with the same response.
    pub fn new(response: MockResponse) -> Self {
        Self::with_sequence(vec![response])
    }

    /// A mock that plays `responses` in order, then repeats the last one.
    pub fn with_sequence(responses: Vec<MockResponse>) -> Self {
        assert!(!responses.is_empty(), "script needs at least one response");
        Self {
            script: Mutex::new(responses.into()),
            delay: None,
            searches: AtomicUsize::new(0),
            detail: None,
        }
    }

    /// Simulate network latency on every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure the record returned by detail lookups.
    pub fn with_detail(mut self, detail: MovieDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Number of `search()` calls dispatched so far.
    pub fn call_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> MockResponse {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().expect("script is never empty")
        }
    }
}

impl SearchBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn search<'a>(
        &'a self,
        _title: &'a str,
        _page: u32,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<SearchPage, Error>> + Send + 'a>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            match response {
                MockResponse::Page {
                    items,
                    total_results,
                } => Ok(SearchPage {
                    items,
                    total_results,
                }),
                MockResponse::Error(msg) => Err(Error::Service(msg)),
            }
        })
    }

    fn detail<'a>(
        &'a self,
        _imdb_id: &'a str,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<MovieDetail, Error>> + Send + 'a>> {
        let response = match &self.detail {
            Some(detail) => Ok(detail.clone()),
            None => Err(Error::Service("no detail configured".into())),
        };
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            response
        })
    }
}
