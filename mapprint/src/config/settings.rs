//! Settings structs for `config.ini`, one per section.

use crate::compositor::{CompositeOptions, ResampleFilter, TRANSPARENT};
use crate::fetch::{
    FetchConfig, DEFAULT_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENT_FETCHES,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::logging::{default_log_dir, default_log_file};
use crate::provider::DEFAULT_USER_AGENT;
use image::Rgba;
use std::path::PathBuf;
use std::time::Duration;

/// User configuration loaded from `~/.mapprint/config.ini`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub fetch: FetchSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Maximum tile requests in flight across all layers
    pub concurrency: usize,
    pub max_attempts: u32,
    pub timeout_secs: u64,
    /// Base delay of the exponential retry backoff
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_MAX_CONCURRENT_FETCHES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Fill for tiles that could not be fetched
    pub placeholder: Rgba<u8>,
    pub resample: ResampleFilter,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            placeholder: TRANSPARENT,
            resample: ResampleFilter::default(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(default_log_dir()),
            file: default_log_file().to_string(),
        }
    }
}

impl ConfigFile {
    /// Fetch settings as a [`FetchConfig`].
    ///
    /// Each call creates a fresh concurrency limiter.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .with_max_concurrent(self.fetch.concurrency)
            .with_max_attempts(self.fetch.max_attempts)
            .with_timeout(Duration::from_secs(self.fetch.timeout_secs))
            .with_backoff(Duration::from_millis(self.fetch.backoff_ms))
    }

    pub fn composite_options(&self) -> CompositeOptions {
        CompositeOptions::default()
            .with_placeholder(self.render.placeholder)
            .with_filter(self.render.resample)
    }
}
