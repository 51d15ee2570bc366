//! Fetch configuration.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default timeout for a single tile request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default number of attempts per tile, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff between attempts.
pub const DEFAULT_BACKOFF_MS: u64 = 100;

/// Default number of tile requests in flight at once.
///
/// Public tile servers ask clients to keep parallelism low; 16 stays well
/// inside what OpenStreetMap and Bing tolerate.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Configuration for tile fetching.
///
/// The concurrency limit is a shared semaphore: every clone of a config hands
/// out permits from the same pool, so one limit bounds all layers of a render.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout for each individual request.
    ///
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Attempts per tile before it is reported as failed.
    ///
    /// Default: 3
    pub max_attempts: u32,

    /// Base delay for exponential backoff; attempt `n` waits `base * 2^(n-1)`.
    ///
    /// Default: 100 ms
    pub backoff_base: Duration,

    /// Shared limiter for requests in flight.
    pub limiter: Arc<Semaphore>,

    max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_MS),
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_FETCHES)),
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl FetchConfig {
    /// Creates a fetch configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the number of attempts per tile. Values below 1 are raised to 1.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the backoff base delay.
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Replaces the limiter with a fresh one allowing `limit` requests in
    /// flight. Values below 1 are raised to 1.
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        let limit = limit.max(1);
        self.limiter = Arc::new(Semaphore::new(limit));
        self.max_concurrent = limit;
        self
    }

    /// Maximum number of requests in flight.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << shift)
    }
}
