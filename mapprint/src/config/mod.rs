//! User configuration from `~/.mapprint/config.ini`.
//!
//! The file holds the knobs that stay the same across maps: fetch
//! concurrency and retries, the placeholder color, the resampling filter,
//! and where logs go. Everything about a particular map lives in its
//! definition file instead.
//!
//! # Example
//!
//! ```no_run
//! use mapprint::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let fetch = config.fetch_config();
//! let options = config.composite_options();
//! # Ok::<(), mapprint::config::ConfigFileError>(())
//! ```

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, FetchSettings, LoggingSettings, RenderSettings};
