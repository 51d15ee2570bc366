//! CLI runner for common setup.
//!
//! Loads `config.ini` and initializes logging once per command.

use crate::error::CliError;
use mapprint::config::{config_file_path, ConfigFile};
use mapprint::logging::{init_logging, LoggingGuard};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Loads the config file (defaults if absent) and starts logging.
    ///
    /// `config_path` overrides `~/.mapprint/config.ini`.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("mapprint v{}", mapprint::VERSION);
        info!(
            config = %self.config_path.display(),
            log = %self.logging_guard.path().display(),
            "mapprint CLI: {} command",
            command
        );
    }
}
