//! HTTP transport for network tile sources.
//!
//! Tile sources talk to [`AsyncHttpClient`] instead of `reqwest` directly so
//! tests can serve canned tile bytes.

use std::time::Duration;

use super::types::ProviderError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches raw response bodies over HTTP.
pub trait AsyncHttpClient: Send + Sync {
    /// GETs `url` and returns the body.
    ///
    /// A non-2xx response is `ProviderError::HttpStatus`; connection,
    /// timeout and body errors are `ProviderError::HttpError`.
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

/// `reqwest`-backed client with rustls.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Client whose requests give up after `timeout_secs`.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("reliefgrid/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::HttpError(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { inner })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let transport = |e: reqwest::Error| ProviderError::HttpError(format!("{}: {}", url, e));

        let response = self.inner.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}
