//! HTTP client abstraction for testability

use super::types::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Trait for asynchronous HTTP client operations.
///
/// The tile fetcher only ever needs GET; the abstraction exists so tests can
/// substitute canned responses for a real network.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Default User-Agent string for tile requests.
///
/// Public tile servers (OpenStreetMap in particular) reject anonymous clients.
pub const DEFAULT_USER_AGENT: &str = concat!("mapprint/", env!("CARGO_PKG_VERSION"));

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new AsyncReqwestClient with default configuration.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_settings(Duration::from_secs(30), DEFAULT_USER_AGENT)
    }

    /// Creates a new AsyncReqwestClient with a custom timeout and User-Agent.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            // Keep connections warm across the tiles of a grid
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                ProviderError::connection(format!("Failed to create async HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                if e.is_timeout() {
                    return Err(ProviderError::Timeout(url.to_string()));
                }
                return Err(ProviderError::connection(format!("Request failed: {}", e)));
            }
        };

        // Check HTTP status
        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(ProviderError::status(
                status.as_u16(),
                format!("HTTP {} from {}", status, url),
            ));
        }

        // Read response body
        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(ProviderError::connection(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        }
    }
}
