//! Traits and interfaces for site-agnostic listing retrieval

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SearchParams;
use crate::models::Listing;

/// Ways a search fetch can fail. Each is fatal for the run; there is no
/// retry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("search request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("search request timed out")]
    Timeout(#[source] reqwest::Error),
    #[error("search returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }
}

/// A site that can be searched for car listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Display name for the site, used in logs.
    fn source_name(&self) -> &'static str;

    /// Run one search and return the listings in page order. An empty
    /// result is not an error.
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>, FetchError>;
}
