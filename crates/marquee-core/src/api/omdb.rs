//! OMDb backend: paged title search and per-id detail lookup.
//!
//! The wire format uses capitalised JSON keys, reports `totalResults` as a
//! decimal string, and signals failure in-band via `"Response": "False"`
//! plus an `Error` message. Missing artwork is the literal string `"N/A"`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use super::{SearchBackend, SearchPage};
use crate::{Config, Error, MovieDetail, MovieSummary};

pub struct OmdbBackend {
    base_url: String,
    api_key: String,
}

impl OmdbBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }
}

impl SearchBackend for OmdbBackend {
    fn name(&self) -> &str {
        "OMDb"
    }

    fn search<'a>(
        &'a self,
        title: &'a str,
        page: u32,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<SearchPage, Error>> + Send + 'a>> {
        Box::pin(async move {
            let page = page.to_string();
            let resp = client
                .get(&self.base_url)
                .query(&[
                    ("apikey", self.api_key.as_str()),
                    ("s", title),
                    ("type", "movie"),
                    ("page", &page),
                ])
                .timeout(timeout)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(Error::Service(format!("HTTP {}", status)));
            }

            let envelope: SearchEnvelope = resp.json().await?;
            envelope.into_page()
        })
    }

    fn detail<'a>(
        &'a self,
        imdb_id: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<MovieDetail, Error>> + Send + 'a>> {
        Box::pin(async move {
            let resp = client
                .get(&self.base_url)
                .query(&[
                    ("apikey", self.api_key.as_str()),
                    ("i", imdb_id),
                    ("plot", "full"),
                ])
                .timeout(timeout)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(Error::Service(format!("HTTP {}", status)));
            }

            let envelope: DetailEnvelope = resp.json().await?;
            envelope.into_detail()
        })
    }
}

/// `totalResults` arrives as a decimal string.
fn u32_from_string<'de, D>(de: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    s.trim().parse().map_err(serde::de::Error::custom)
}

fn none_if_na(value: String) -> Option<String> {
    if value.is_empty() || value == "N/A" {
        None
    } else {
        Some(value)
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "Search", default)]
    search: Vec<SummaryRecord>,
    #[serde(
        rename = "totalResults",
        default,
        deserialize_with = "u32_from_string"
    )]
    total_results: u32,
}

impl SearchEnvelope {
    fn into_page(self) -> Result<SearchPage, Error> {
        if self.response != "True" {
            return Err(Error::Service(
                self.error.unwrap_or_else(|| "unknown service error".into()),
            ));
        }
        Ok(SearchPage {
            items: self.search.into_iter().map(Into::into).collect(),
            total_results: self.total_results,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SummaryRecord {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Type", default)]
    kind: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

impl From<SummaryRecord> for MovieSummary {
    fn from(record: SummaryRecord) -> Self {
        MovieSummary {
            imdb_id: record.imdb_id,
            title: record.title,
            year: record.year,
            kind: record.kind,
            poster: none_if_na(record.poster),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Rated", default)]
    rated: String,
    #[serde(rename = "Runtime", default)]
    runtime: String,
    #[serde(rename = "Genre", default)]
    genre: String,
    #[serde(rename = "Director", default)]
    director: String,
    #[serde(rename = "Actors", default)]
    actors: String,
    #[serde(rename = "Plot", default)]
    plot: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

impl DetailEnvelope {
    fn into_detail(self) -> Result<MovieDetail, Error> {
        if self.response != "True" {
            return Err(Error::Service(
                self.error.unwrap_or_else(|| "unknown service error".into()),
            ));
        }
        Ok(MovieDetail {
            imdb_id: self.imdb_id,
            title: self.title,
            year: self.year,
            rated: self.rated,
            runtime: self.runtime,
            genre: self.genre,
            director: self.director,
            actors: self.actors,
            plot: self.plot,
            poster: none_if_na(self.poster),
        })
    }
}
