//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use mapprint::config::ConfigFileError;
use mapprint::provider::ProviderError;
use mapprint::render::{ConfigurationError, RenderError};
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to load or write config.ini
    Config(ConfigFileError),
    /// The map definition could not be loaded
    Definition(ConfigurationError),
    /// Failed to create the HTTP client
    Client(ProviderError),
    /// The render itself failed
    Render(RenderError),
    /// Failed to write output file
    FileWrite { path: String, error: image::ImageError },
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit code for this error.
    ///
    /// Invalid input exits with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Definition(_) => 2,
            CliError::Render(RenderError::Configuration(_)) => 2,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Render(RenderError::LayerFailed { .. }) = self {
            eprintln!();
            eprintln!("No tile could be fetched for any layer. Check that:");
            eprintln!("  1. The tile server is reachable from this machine");
            eprintln!("  2. The layer URL templates contain ${{x}}, ${{y}} and ${{z}}");
            eprintln!("  3. The zoom level is supported by the provider");
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Definition(e) => write!(f, "Invalid map definition: {}", e),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Render(e) => write!(f, "Render failed: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Definition(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::Render(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_exit_code() {
        let err = CliError::Definition(ConfigurationError::NoLayers);
        assert_eq!(err.exit_code(), 2);

        let err = CliError::Render(RenderError::Task("panicked".to_string()));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_display_prefixes() {
        let err = CliError::Render(RenderError::Configuration(ConfigurationError::NoLayers));
        assert!(err.to_string().starts_with("Render failed: "));

        let err = CliError::LoggingInit("denied".to_string());
        assert_eq!(err.to_string(), "Failed to initialize logging: denied");
    }
}
