//! Page fetcher
//!
//! Plain HTTP GETs with a browser identifier. The site refuses requests that
//! do not look like they come from a browser.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Identifier sent with search-result requests
pub const SEARCH_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:52.0) Gecko/20100101 Firefox/52.0";

/// Identifier sent with product-page requests
pub const PRODUCT_USER_AGENT: &str = "Mozilla/5.0 (X11; CrOS x86_64 12871.102.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/81.0.4044.141 Safari/537.36";

/// Fetcher configuration
#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    /// Request timeout in seconds (transport default when unset)
    pub timeout_secs: Option<u64>,
}

/// Errors from fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

/// Source of raw page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return its body
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<String, FetchError>;
}

/// Thread-safe reference to a fetcher
pub type SharedFetcher = Arc<dyn PageFetcher>;

/// Headers carrying only the given browser identifier
pub fn browser_headers(user_agent: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    let value =
        HeaderValue::from_str(user_agent).map_err(|e| FetchError::InvalidHeader(e.to_string()))?;
    headers.insert(USER_AGENT, value);
    Ok(headers)
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, mut headers: HeaderMap) -> Result<String, FetchError> {
        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, HeaderValue::from_static(PRODUCT_USER_AGENT));
        }

        debug!("Fetching: {}", url);

        let response = self.client.get(url).headers(headers).send().await?;

        // Error pages are still parsed; the extractors just find nothing on them
        if !response.status().is_success() {
            warn!("Fetch of {} returned status: {}", url, response.status());
        }

        Ok(response.text().await?)
    }
}

/// Create a shared HTTP fetcher
pub fn create_fetcher(config: &FetchConfig) -> Result<SharedFetcher, FetchError> {
    Ok(Arc::new(HttpFetcher::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers(SEARCH_USER_AGENT).unwrap();
        let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(ua.contains("Mozilla"));
        assert!(ua.contains("Firefox"));
    }

    #[test]
    fn test_create_fetcher() {
        let config = FetchConfig {
            timeout_secs: Some(10),
        };
        assert!(create_fetcher(&config).is_ok());
    }
}
