//! mapprint CLI - Command-line interface
//!
//! Renders map definition files to PNG and manages `~/.mapprint/config.ini`.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::config::ConfigCommands;
use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "mapprint")]
#[command(version = mapprint::VERSION)]
#[command(about = "Render static maps from web map tiles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a map definition (JSON) to a PNG file
    Render {
        /// Map definition file
        #[arg(long)]
        map: PathBuf,

        /// Output PNG path
        #[arg(long, short)]
        output: PathBuf,

        /// Config file to use instead of ~/.mapprint/config.ini
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum tile requests in flight (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Attempts per tile (overrides config)
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            map,
            output,
            config,
            concurrency,
            max_attempts,
        } => commands::render::run(RenderArgs {
            map,
            output,
            config,
            concurrency,
            max_attempts,
        }),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
