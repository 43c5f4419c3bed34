use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub mod api;
pub mod config_file;
pub mod detail;
pub mod pager;
pub mod session;
pub mod store;

// Re-export for convenience
pub use api::{SearchBackend, SearchPage, omdb::OmdbBackend};
pub use detail::{DetailLoader, DetailState};
pub use pager::Pager;
pub use session::SearchSession;
pub use store::FavoritesStore;

/// A movie summary as returned by a paged title search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieSummary {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub kind: String,
    /// Poster URL; `None` when the service has no artwork for the entry.
    pub poster: Option<String>,
}

/// A full movie record as returned by a detail lookup, and the shape
/// persisted for favorites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieDetail {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub rated: String,
    pub runtime: String,
    pub genre: String,
    pub director: String,
    pub actors: String,
    pub plot: String,
    pub poster: Option<String>,
}

/// Observable state of a search session for the current query.
///
/// Exactly one variant is active at a time; any fetch outcome for the
/// current query overwrites the prior state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    /// No query submitted yet.
    Idle,
    /// First page of a new query is in flight.
    InProgress,
    /// Aggregated results across all pages fetched so far.
    Loaded {
        items: Vec<MovieSummary>,
        total_results: u32,
    },
    /// The last fetch failed. No payload: the view offers refresh/resubmit.
    Error,
}

impl SearchState {
    /// Whether this is a settled outcome (`Loaded` or `Error`).
    pub fn is_settled(&self) -> bool {
        matches!(self, SearchState::Loaded { .. } | SearchState::Error)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service error: {0}")]
    Service(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration for the search engine.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Path to the favorites SQLite database (optional; in-memory if unset).
    pub favorites_path: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("favorites_path", &self.favorites_path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.omdbapi.com/".into(),
            timeout_secs: 10,
            favorites_path: None,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
