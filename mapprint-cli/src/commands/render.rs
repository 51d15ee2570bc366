//! Render command - turn a map definition into a PNG.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mapprint::definition::MapDefinition;
use mapprint::overlay::FileMarkerResolver;
use mapprint::provider::AsyncReqwestClient;
use mapprint::render::{MapRenderer, RenderDiagnostics};
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the render command.
pub struct RenderArgs {
    pub map: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub max_attempts: Option<u32>,
}

/// Run the render command.
pub fn run(args: RenderArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref())?;
    runner.log_startup("render");
    let config = runner.config();

    let definition = MapDefinition::from_path(&args.map).map_err(CliError::Definition)?;

    let mut fetch = config.fetch_config();
    if let Some(limit) = args.concurrency {
        fetch = fetch.with_max_concurrent(limit);
    }
    if let Some(attempts) = args.max_attempts {
        fetch = fetch.with_max_attempts(attempts);
    }

    let client = AsyncReqwestClient::with_settings(
        Duration::from_secs(config.fetch.timeout_secs),
        &config.fetch.user_agent,
    )
    .map_err(CliError::Client)?;

    // Relative marker paths resolve against the definition file
    let marker_dir = args
        .map
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let renderer = MapRenderer::with_config(Arc::new(client), fetch, config.composite_options())
        .with_markers(Arc::new(FileMarkerResolver::new(marker_dir)));

    println!("Rendering {}", args.map.display());
    let start = Instant::now();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let output = runtime.block_on(renderer.render(&definition))?;

    output
        .save_png(&args.output)
        .map_err(|error| CliError::FileWrite {
            path: args.output.display().to_string(),
            error,
        })?;

    let elapsed = start.elapsed();
    info!(
        output = %args.output.display(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Map written"
    );

    print_report(&output.diagnostics, &args.output, elapsed);
    Ok(())
}

fn print_report(diagnostics: &RenderDiagnostics, output: &Path, elapsed: Duration) {
    println!(
        "Wrote {} ({}x{} px, {}x{} tiles) in {:.2}s",
        output.display(),
        diagnostics.width,
        diagnostics.height,
        diagnostics.grid_columns,
        diagnostics.grid_rows,
        elapsed.as_secs_f64()
    );
    println!("  {}", diagnostics.summary());

    for layer in diagnostics.layers.iter().filter(|l| l.failed() > 0) {
        warn!(layer = layer.index, failed = layer.failed(), "Layer incomplete");
        println!(
            "  layer {} ({}, zoom {}): {} of {} tiles missing",
            layer.index,
            layer.provider,
            layer.zoom,
            layer.failed(),
            layer.requested
        );
    }
    for skipped in &diagnostics.skipped_features {
        println!("  feature {} skipped: {}", skipped.index, skipped.error);
    }
}
