//! Configuration management CLI commands.

use clap::Subcommand;
use mapprint::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Write a commented config.ini with default values if none exists
    Init,

    /// Print the effective settings
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init => run_init(),
        ConfigCommands::Show => run_show(),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_init() -> Result<(), CliError> {
    let existed = config_file_path().exists();
    let path = ConfigFile::ensure_exists()?;
    if existed {
        println!("Config file already exists: {}", path.display());
    } else {
        println!("Created config file: {}", path.display());
    }
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let [r, g, b, a] = config.render.placeholder.0;

    println!("[fetch]");
    println!("  concurrency  = {}", config.fetch.concurrency);
    println!("  max_attempts = {}", config.fetch.max_attempts);
    println!("  timeout_secs = {}", config.fetch.timeout_secs);
    println!("  backoff_ms   = {}", config.fetch.backoff_ms);
    println!("  user_agent   = {}", config.fetch.user_agent);
    println!("[render]");
    println!("  placeholder  = #{:02x}{:02x}{:02x}{:02x}", r, g, b, a);
    println!("  resample     = {:?}", config.render.resample);
    println!("[logging]");
    println!("  directory    = {}", config.logging.directory.display());
    println!("  file         = {}", config.logging.file);
    Ok(())
}
