//! Concurrent tile acquisition.
//!
//! [`TileFetcher`] downloads and decodes every tile of a [`TileGrid`]. Each
//! tile runs as its own task with its own retry loop; a shared semaphore from
//! [`FetchConfig`] bounds how many requests are in flight across all grids
//! fetched with the same configuration.
//!
//! A tile that exhausts its attempts, is rejected by the provider, or does
//! not decode is recorded as a [`TileFailure`]. Fetching a grid never fails as
//! a whole; the caller decides what an all-failed grid means.

mod config;
mod results;

pub use config::{
    FetchConfig, DEFAULT_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENT_FETCHES,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use results::{FailureKind, TileFailure, TileResults};

use crate::coord::TileIndex;
use crate::grid::TileGrid;
use crate::provider::{AsyncHttpClient, ProviderAdapter, ProviderError};
use image::DynamicImage;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

/// Fetches the tiles of a grid through an HTTP client.
pub struct TileFetcher<C>
where
    C: AsyncHttpClient + 'static,
{
    client: Arc<C>,
    config: FetchConfig,
}

impl<C> TileFetcher<C>
where
    C: AsyncHttpClient + 'static,
{
    /// Creates a fetcher with default configuration.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_config(client, FetchConfig::default())
    }

    /// Creates a fetcher with custom configuration.
    pub fn with_config(client: Arc<C>, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Fetches every tile of `grid` using `adapter` for addressing.
    ///
    /// Returns once every tile has either succeeded or permanently failed.
    pub async fn fetch(&self, grid: &TileGrid, adapter: &ProviderAdapter) -> TileResults {
        let mut results = TileResults::new();
        let mut downloads = JoinSet::new();
        let adapter = Arc::new(adapter.clone());
        let started = Instant::now();

        let mut pending: HashSet<TileIndex> = HashSet::with_capacity(grid.len());

        for placed in grid.tiles() {
            let index = placed.index;
            if !pending.insert(index) {
                continue;
            }

            let client = Arc::clone(&self.client);
            let adapter = Arc::clone(&adapter);
            let config = self.config.clone();

            downloads.spawn(async move { fetch_tile(index, client, adapter, config).await });
        }

        // Collect results as they complete
        while let Some(joined) = downloads.join_next().await {
            match joined {
                Ok(Ok((index, image))) => {
                    pending.remove(&index);
                    results.add_success(index, image);
                }
                Ok(Err(failure)) => {
                    warn!(
                        tile = %failure.index,
                        attempts = failure.attempts,
                        kind = ?failure.kind,
                        error = %failure.error,
                        "Tile fetch failed"
                    );
                    pending.remove(&failure.index);
                    results.add_failure(failure);
                }
                Err(join_err) => {
                    warn!(error = %join_err, "Tile fetch task panicked");
                }
            }
        }

        // Anything still pending belongs to a task that died without reporting
        for index in pending {
            results.add_failure(TileFailure {
                index,
                attempts: 0,
                kind: FailureKind::Aborted,
                error: "fetch task aborted".to_string(),
            });
        }

        debug!(
            provider = adapter.id(),
            zoom = grid.zoom(),
            success_count = results.success_count(),
            failure_count = results.failure_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Grid fetch complete"
        );

        results
    }
}

/// Fetches and decodes a single tile with retries.
async fn fetch_tile<C>(
    index: TileIndex,
    client: Arc<C>,
    adapter: Arc<ProviderAdapter>,
    config: FetchConfig,
) -> Result<(TileIndex, DynamicImage), TileFailure>
where
    C: AsyncHttpClient + 'static,
{
    let mut last_error = String::new();
    let mut attempts = 0;

    for attempt in 1..=config.max_attempts {
        attempts = attempt;
        let url = adapter.url_for(&index, attempt - 1);

        // One permit per attempt; backoff sleeps hold no slot
        let permit = match Arc::clone(&config.limiter).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return Err(TileFailure {
                    index,
                    attempts: attempt - 1,
                    kind: FailureKind::Aborted,
                    error: "fetch limiter closed".to_string(),
                })
            }
        };

        trace!(tile = %index, url = %url, attempt = attempt, "Tile request");

        let outcome = match tokio::time::timeout(config.request_timeout, client.get(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(url.clone())),
        };
        drop(permit);

        match outcome {
            Ok(bytes) => {
                return decode_tile(&bytes)
                    .map(|image| (index, image))
                    .map_err(|error| TileFailure {
                        index,
                        attempts: attempt,
                        kind: FailureKind::Decode,
                        error,
                    });
            }
            Err(e) => {
                warn!(
                    tile = %index,
                    attempt = attempt,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Tile request error"
                );
                last_error = e.to_string();
                if !e.is_retryable() {
                    return Err(TileFailure {
                        index,
                        attempts: attempt,
                        kind: FailureKind::Rejected,
                        error: last_error,
                    });
                }
            }
        }

        // Exponential backoff before retry
        if attempt < config.max_attempts {
            let backoff = config.backoff_for(attempt);
            trace!(backoff_ms = backoff.as_millis() as u64, "Backoff before retry");
            tokio::time::sleep(backoff).await;
        }
    }

    Err(TileFailure {
        index,
        attempts,
        kind: FailureKind::Exhausted,
        error: last_error,
    })
}

/// Decodes a tile response body.
fn decode_tile(bytes: &[u8]) -> Result<DynamicImage, String> {
    if bytes.is_empty() {
        return Err("empty response body".to_string());
    }
    image::load_from_memory(bytes).map_err(|e| format!("image decode error: {}", e))
}
