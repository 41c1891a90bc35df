//! HTTP fetcher for the delivery feed
//!
//! This module provides the fetcher that downloads the published sheet with
//! features including:
//! - Cache-defeating query parameter on every request
//! - No-cache request headers and redirect following
//! - Cooperative cancellation; a new fetch preempts the previous one
//! - UTF-8 decoding with a byte-for-byte fallback

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use encoding_rs::UTF_8;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, PRAGMA},
    redirect::Policy,
    Client,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::FeedSource;
use crate::config::FeedConfig;
use crate::utils::decode_bytewise;
use crate::utils::error::FetchError;

/// Query parameter carrying the cache-busting timestamp
pub const CACHE_BUST_PARAM: &str = "nocache";

/// A fetch started through [`FeedFetcher::fetch_text`]
struct InFlight {
    id: u64,
    token: CancellationToken,
}

/// Fetcher for one published feed URL
pub struct FeedFetcher {
    /// HTTP client with configured timeout and redirect policy
    client: Client,

    /// Feed URL without the cache-busting parameter
    url: Url,

    /// Fetch currently in flight, if any
    current: Mutex<Option<InFlight>>,

    /// Id handed to the next fetch
    next_id: AtomicU64,
}

impl FeedFetcher {
    /// Create a fetcher with default settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for an unparsable or non-HTTP URL and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(url: &str) -> Result<Self, FetchError> {
        Self::with_config(
            url,
            Duration::from_secs(30),
            &format!("delivery-board/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Create a fetcher with a custom timeout and User-Agent
    ///
    /// # Errors
    ///
    /// Same as [`FeedFetcher::new`]
    pub fn with_config(url: &str, timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let url = parse_feed_url(url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(Policy::limited(10))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            url,
            current: Mutex::new(None),
            next_id: AtomicU64::new(0),
        })
    }

    /// Create a fetcher from the `[feed]` configuration section
    ///
    /// # Errors
    ///
    /// Same as [`FeedFetcher::new`]
    pub fn from_config(config: &FeedConfig) -> Result<Self, FetchError> {
        Self::with_config(&config.url, config.request_timeout(), &config.user_agent)
    }

    /// Feed URL without the cache-busting parameter
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the feed, cancelling any fetch this fetcher still has in flight
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Cancelled` if a later call preempts this one,
    /// otherwise the errors of [`FeedFetcher::fetch_with_token`]
    pub async fn fetch_text(&self) -> Result<String, FetchError> {
        let (id, token) = self.begin();
        let result = self.fetch_with_token(&token).await;
        self.finish(id);
        result
    }

    /// Cancel the fetch in flight, if any
    pub fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(flight) = current.take() {
            flight.token.cancel();
        }
    }

    /// Cancel the previous fetch and register a fresh one
    fn begin(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let flight = InFlight {
            id,
            token: token.clone(),
        };
        if let Some(previous) = current.replace(flight) {
            tracing::debug!(previous = previous.id, "Cancelling previous in-flight fetch");
            previous.token.cancel();
        }
        (id, token)
    }

    /// Forget the registered fetch if it is still `id`
    fn finish(&self, id: u64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if current.as_ref().is_some_and(|f| f.id == id) {
            current.take();
        }
    }

    /// Fetch the feed, giving up as soon as `token` is cancelled
    ///
    /// # Errors
    ///
    /// - `FetchError::Cancelled` when `token` fires first
    /// - `FetchError::Status` for a non-success response
    /// - `FetchError::Timeout` / `FetchError::Http` for transport failures
    pub async fn fetch_with_token(&self, token: &CancellationToken) -> Result<String, FetchError> {
        if token.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let url = cache_busted_url(&self.url, Utc::now().timestamp_millis());

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(url = %self.url, "Fetch cancelled");
                Err(FetchError::Cancelled)
            }
            result = self.request(url) => result,
        }
    }

    async fn request(&self, url: Url) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "Requesting feed");

        let response = self
            .client
            .get(url)
            .headers(Self::build_headers())
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Feed request failed");
            return Err(FetchError::status(status));
        }

        let bytes = response.bytes().await.map_err(FetchError::from_transport)?;
        tracing::debug!(bytes = bytes.len(), "Feed downloaded");

        Ok(decode_body(&bytes))
    }

    /// Request headers asking every cache on the way to stay out
    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/csv,text/plain;q=0.9,*/*;q=0.8"),
        );
        headers
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<String, FetchError> {
        self.fetch_with_token(cancel).await
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Parse and check a feed URL
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` unless the URL parses with an http(s) scheme
pub fn parse_feed_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl(format!(
            "{url}: unsupported scheme '{other}'"
        ))),
    }
}

/// Append the cache-busting timestamp to a feed URL
pub fn cache_busted_url(url: &Url, timestamp_ms: i64) -> Url {
    let mut busted = url.clone();
    busted
        .query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &timestamp_ms.to_string());
    busted
}

/// Decode a response body as UTF-8, falling back to a byte-for-byte mapping
///
/// A leading byte order mark is dropped. This never fails.
pub fn decode_body(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text.into_owned(),
        None => {
            tracing::warn!("Feed body is not valid UTF-8; decoding byte-for-byte");
            decode_bytewise(bytes)
        }
    }
}
