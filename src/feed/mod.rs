//! Feed retrieval
//!
//! The refresh pipeline reads its raw text through [`FeedSource`], so the
//! scheduler does not care whether the text comes from the network
//! ([`fetcher::FeedFetcher`]) or from a scripted source in tests.

pub mod fetcher;

pub use fetcher::FeedFetcher;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::utils::error::FetchError;

/// Source of raw feed text
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Retrieve the full feed text
    ///
    /// Implementations must resolve to `FetchError::Cancelled` promptly once
    /// `cancel` fires.
    async fn fetch(&self, cancel: &CancellationToken) -> Result<String, FetchError>;

    /// Human-readable name of the source for logs
    fn describe(&self) -> String {
        "feed".to_string()
    }
}

#[async_trait]
impl<T: FeedSource + ?Sized> FeedSource for std::sync::Arc<T> {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<String, FetchError> {
        (**self).fetch(cancel).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
