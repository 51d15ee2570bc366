//! Logging setup for mapprint.
//!
//! Two outputs share one `RUST_LOG` filter (default `info`):
//! - a plain-text log file, truncated at the start of every run
//! - compact colored output on stderr, leaving stdout to the CLI

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive.
///
/// Dropping the guard flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Installs the global tracing subscriber.
///
/// Creates `log_dir` if needed and empties any log left by a previous run.
/// Can only succeed once per process.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be prepared.
pub fn init_logging(log_dir: &Path, log_file: &str) -> Result<LoggingGuard, io::Error> {
    let path = prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}

/// Creates the log directory and truncates the log file.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file);
    fs::write(&path, "")?;
    Ok(path)
}

/// Default log directory, relative to the working directory.
pub fn default_log_dir() -> &'static str {
    "logs"
}

pub fn default_log_file() -> &'static str {
    "mapprint.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        assert_eq!(default_log_dir(), "logs");
        assert_eq!(default_log_file(), "mapprint.log");
    }

    #[test]
    fn test_prepare_creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("deep").join("logs");

        let path = prepare_log_file(&dir, "render.log").unwrap();

        assert_eq!(path, dir.join("render.log"));
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_truncates_previous_run() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mapprint.log");
        fs::write(&path, "old log data").unwrap();

        prepare_log_file(temp.path(), "mapprint.log").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_fails_when_directory_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("logs");
        fs::write(&blocker, "not a directory").unwrap();

        assert!(prepare_log_file(&blocker, "mapprint.log").is_err());
    }
}
