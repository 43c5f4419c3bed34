//! Full-record lookup for a single movie, with favorite toggling.
//!
//! Mirrors the search session's shape: fetches run on their own task, the
//! observable state goes out through a `watch` channel, and a generation
//! guard keeps a late-arriving lookup from overwriting a newer one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{self, SearchBackend};
use crate::{Config, Error, FavoritesStore, MovieDetail};

/// Observable state of a detail lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Idle,
    InProgress,
    Loaded(MovieDetail),
    Error,
}

struct Shared {
    current: Option<MovieDetail>,
    generation: u64,
    state: watch::Sender<DetailState>,
}

pub struct DetailLoader {
    backend: Arc<dyn SearchBackend>,
    client: reqwest::Client,
    timeout: Duration,
    store: Arc<FavoritesStore>,
    shared: Arc<Mutex<Shared>>,
    cancel: CancellationToken,
}

impl DetailLoader {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        config: &Config,
        store: Arc<FavoritesStore>,
    ) -> Self {
        let (state, _) = watch::channel(DetailState::Idle);
        Self {
            backend,
            client: api::build_client(),
            timeout: config.timeout(),
            store,
            shared: Arc::new(Mutex::new(Shared {
                current: None,
                generation: 0,
                state,
            })),
            cancel: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.shared.lock().unwrap().state.subscribe()
    }

    pub fn state(&self) -> DetailState {
        self.shared.lock().unwrap().state.borrow().clone()
    }

    /// The record from the last completed fetch, if any.
    pub fn current(&self) -> Option<MovieDetail> {
        self.shared.lock().unwrap().current.clone()
    }

    /// Fetch the full record for `imdb_id`. A newer fetch supersedes any
    /// still in flight.
    pub fn fetch(&self, imdb_id: &str) {
        let generation = {
            let mut shared = self.shared.lock().unwrap();
            shared.generation += 1;
            shared.current = None;
            shared.state.send_replace(DetailState::InProgress);
            shared.generation
        };

        let backend = Arc::clone(&self.backend);
        let client = self.client.clone();
        let timeout = self.timeout;
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        let imdb_id = imdb_id.to_string();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return,
                outcome = backend.detail(&imdb_id, &client, timeout) => outcome,
            };

            let mut shared = shared.lock().unwrap();
            if shared.generation != generation {
                tracing::debug!(imdb_id = %imdb_id, "discarding stale detail lookup");
                return;
            }

            match outcome {
                Ok(detail) => {
                    shared.current = Some(detail.clone());
                    shared.state.send_replace(DetailState::Loaded(detail));
                }
                Err(err) => {
                    tracing::warn!(imdb_id = %imdb_id, error = %err, "detail fetch failed");
                    shared.state.send_replace(DetailState::Error);
                }
            }
        });
    }

    /// Whether the currently loaded movie is stored as a favorite.
    pub fn is_favorite(&self) -> Result<bool, Error> {
        match self.current() {
            Some(detail) => self.store.contains(&detail.imdb_id),
            None => Ok(false),
        }
    }

    /// Toggle the favorite mark for the currently loaded movie. Returns the
    /// new state: `true` when the record was stored, `false` when removed.
    pub fn toggle_favorite(&self) -> Result<bool, Error> {
        let Some(detail) = self.current() else {
            return Err(Error::Validation("no detail loaded".into()));
        };
        if self.store.contains(&detail.imdb_id)? {
            self.store.remove(&detail.imdb_id)?;
            Ok(false)
        } else {
            self.store.insert(&detail)?;
            Ok(true)
        }
    }
}

impl Drop for DetailLoader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
