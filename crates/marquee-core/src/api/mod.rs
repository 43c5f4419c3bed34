//! Remote movie service trait and implementations.

pub mod omdb;

#[cfg(test)]
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::{Error, MovieDetail, MovieSummary};

/// One page of a title search: the items of that page plus the
/// server-reported total across all pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub items: Vec<MovieSummary>,
    pub total_results: u32,
}

/// A remote service that can search for movies by title and fetch a full
/// record by id.
pub trait SearchBackend: Send + Sync {
    /// The canonical name of this service (e.g., "OMDb").
    fn name(&self) -> &str;

    /// Fetch one page of results for the given title. Pages are 1-based.
    fn search<'a>(
        &'a self,
        title: &'a str,
        page: u32,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<SearchPage, Error>> + Send + 'a>>;

    /// Fetch the full record for a movie id.
    fn detail<'a>(
        &'a self,
        imdb_id: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<MovieDetail, Error>> + Send + 'a>>;
}

/// Shared HTTP client for backend queries.
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
