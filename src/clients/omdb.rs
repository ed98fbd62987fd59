use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::OMDB_BASE_URL;

/// One hit from `?s=` search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OmdbSearchItem {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type")]
    pub media_type: String,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OmdbRating {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Full record from `?i=`. Text fields keep the provider's free-form values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct OmdbMovie {
    pub title: String,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub released: Option<String>,
    pub runtime: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub actors: Option<String>,
    pub plot: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub awards: Option<String>,
    pub poster: Option<String>,
    pub ratings: Vec<OmdbRating>,
    pub metascore: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type")]
    pub media_type: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "totalSeasons")]
    pub total_seasons: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseFlag {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Default for OmdbClient {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl OmdbClient {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self::with_shared_client(Client::new(), OMDB_BASE_URL.to_string(), api_key)
    }

    #[must_use]
    pub const fn with_shared_client(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn ensure_key(&self) -> Result<&str> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("OMDB API key is not configured (set omdb.api_key or MEDIA_CATALOG_OMDB_API_KEY)");
        }
        Ok(&self.api_key)
    }

    async fn get_text(&self, query: &str) -> Result<String> {
        let key = self.ensure_key()?;
        let url = format!(
            "{}?apikey={}&{}",
            self.base_url,
            urlencoding::encode(key),
            query
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("OMDB request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OMDB API error: {} - {}", status, body));
        }

        Ok(response.text().await?)
    }

    pub async fn search_by_text(&self, query: &str) -> Result<Vec<OmdbSearchItem>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let body = self
            .get_text(&format!("s={}", urlencoding::encode(query)))
            .await?;
        parse_search(&body)
    }

    pub async fn retrieve_media_data_by_id(&self, imdb_id: &str) -> Result<Option<OmdbMovie>> {
        let body = self
            .get_text(&format!("i={}&plot=full", urlencoding::encode(imdb_id.trim())))
            .await?;
        parse_record(&body)
    }
}

/// A `Response: "False"` search (for example "Movie not found!") is an empty result.
pub fn parse_search(body: &str) -> Result<Vec<OmdbSearchItem>> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).context("Unexpected OMDB search payload")?;

    if envelope.response.eq_ignore_ascii_case("true") {
        return Ok(envelope.search);
    }

    tracing::debug!(
        "OMDB search returned no results: {}",
        envelope.error.unwrap_or_default()
    );
    Ok(vec![])
}

pub fn parse_record(body: &str) -> Result<Option<OmdbMovie>> {
    let flag: ResponseFlag = serde_json::from_str(body).context("Unexpected OMDB record payload")?;

    if !flag.response.eq_ignore_ascii_case("true") {
        tracing::debug!(
            "OMDB lookup returned nothing: {}",
            flag.error.unwrap_or_default()
        );
        return Ok(None);
    }

    let movie: OmdbMovie = serde_json::from_str(body).context("Malformed OMDB record")?;
    Ok(Some(movie))
}
