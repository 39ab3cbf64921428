//! PokeAPI client
//!
//! Fetches JSON from PokeAPI and memoizes the raw response bodies in a
//! [`TtlCache`] keyed by request URL. Payloads are decoded on every read,
//! whether they came from the cache or from the network.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{LocationArea, LocationAreaPage, Pokemon};
use crate::cache::TtlCache;

/// Base URL for the public PokeAPI
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of location areas requested per page
const PAGE_SIZE: u32 = 20;

/// Errors that can occur when fetching from PokeAPI
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    /// Failed to parse JSON payload
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for PokeAPI backed by an in-memory response cache
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    client: Client,
    cache: TtlCache,
    base_url: String,
}

impl PokeApiClient {
    /// Create a client against a base URL such as [`DEFAULT_BASE_URL`]
    pub fn with_base_url(cache: TtlCache, base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), cache, base_url)
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(client: Client, cache: TtlCache, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            cache,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The response cache shared by all clones of this client
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// URL of the first page of the location-area listing
    pub fn first_location_page_url(&self) -> String {
        format!("{}/location-area/?offset=0&limit={}", self.base_url, PAGE_SIZE)
    }

    pub fn location_area_url(&self, name: &str) -> String {
        format!("{}/location-area/{}", self.base_url, name)
    }

    pub fn pokemon_url(&self, name: &str) -> String {
        format!("{}/pokemon/{}", self.base_url, name)
    }

    /// Fetch a page of location areas by its full URL
    pub async fn location_page(&self, url: &str) -> Result<LocationAreaPage, ApiError> {
        self.fetch_json(url).await
    }

    /// Fetch a location area and its encounters by name or id
    pub async fn location_area(&self, name: &str) -> Result<LocationArea, ApiError> {
        self.fetch_json(&self.location_area_url(name)).await
    }

    /// Fetch a Pokemon by name or id
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon, ApiError> {
        self.fetch_json(&self.pokemon_url(name)).await
    }

    /// Fetch and decode a JSON document, consulting the cache first
    ///
    /// # Behavior
    /// - A cache hit is decoded without touching the network
    /// - On a miss the body is fetched and decoded, and cached only if decoding succeeds
    /// - Errors are returned as-is; nothing is retried
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        if let Some(bytes) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(serde_json::from_slice(&bytes)?);
        }

        debug!(url, "cache miss, fetching");
        let bytes = self.fetch_bytes(url).await?;
        let value = serde_json::from_slice(&bytes)?;
        self.cache.put(url, bytes);
        Ok(value)
    }

    /// Perform a GET and return the raw body of a successful response
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
