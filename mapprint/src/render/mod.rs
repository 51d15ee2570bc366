//! Map rendering pipeline.
//!
//! [`MapRenderer`] runs a validated map through every stage: grid
//! construction per layer, concurrent tile fetching, compositing, the
//! optional size fit, and the vector overlay. Fetches for all layers share
//! the fetcher's concurrency limit. The CPU-bound stages run on the blocking
//! thread pool and never touch the canvas concurrently. Remote marker images
//! are downloaded through the tile client before the overlay is drawn.
//!
//! ```ignore
//! let renderer = MapRenderer::new(Arc::new(AsyncReqwestClient::new()?));
//! let output = renderer.render(&MapDefinition::from_path(path)?).await?;
//! output.save_png("map.png")?;
//! println!("{}", output.diagnostics.summary());
//! ```

mod diagnostics;
mod error;

pub use diagnostics::{DiagnosticsSummary, LayerDiagnostics, RenderDiagnostics};
pub use error::{ConfigurationError, RenderError};

use crate::compositor::{composite, fit_to_size, CompositeOptions, LayerRaster};
use crate::definition::{MapDefinition, MapPlan};
use crate::fetch::{FetchConfig, TileFetcher, TileResults};
use crate::grid::build_grid;
use crate::overlay::{
    is_remote, FeatureCollection, FileMarkerResolver, GeoFeature, MarkerResolver,
    OverlayRenderer, PrefetchedMarkers, Projector,
};
use crate::provider::{AsyncHttpClient, ProviderError};
use futures::future::join_all;
use image::{ImageFormat, RgbaImage};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A finished map.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub canvas: RgbaImage,
    pub diagnostics: RenderDiagnostics,
}

impl RenderOutput {
    /// Writes the canvas as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.canvas.save_with_format(path, ImageFormat::Png)
    }
}

/// Renders map definitions into raster images.
pub struct MapRenderer<C>
where
    C: AsyncHttpClient + 'static,
{
    fetcher: TileFetcher<C>,
    options: CompositeOptions,
    markers: Arc<dyn MarkerResolver>,
}

impl<C> MapRenderer<C>
where
    C: AsyncHttpClient + 'static,
{
    /// Creates a renderer with default fetch and compositing settings.
    ///
    /// Markers are loaded from the working directory.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_config(client, FetchConfig::default(), CompositeOptions::default())
    }

    pub fn with_config(client: Arc<C>, fetch: FetchConfig, options: CompositeOptions) -> Self {
        Self {
            fetcher: TileFetcher::with_config(client, fetch),
            options,
            markers: Arc::new(FileMarkerResolver::default()),
        }
    }

    /// Replaces the marker resolver.
    pub fn with_markers(mut self, markers: Arc<dyn MarkerResolver>) -> Self {
        self.markers = markers;
        self
    }

    pub fn options(&self) -> &CompositeOptions {
        &self.options
    }

    /// Validates and renders a map definition.
    pub async fn render(&self, definition: &MapDefinition) -> Result<RenderOutput, RenderError> {
        let plan = definition.validate()?;
        self.render_plan(&plan).await
    }

    /// Renders an already validated map.
    ///
    /// Missing tiles and undrawable features degrade the output and are
    /// reported in the diagnostics. The render fails when a layer zoom is out
    /// of range, a tile has an unsupported pixel format, or no layer fetched
    /// a single tile.
    pub async fn render_plan(&self, plan: &MapPlan) -> Result<RenderOutput, RenderError> {
        let started = Instant::now();
        if plan.layers.is_empty() {
            return Err(ConfigurationError::NoLayers.into());
        }
        let base = build_grid(&plan.bbox, plan.zoom).map_err(ConfigurationError::from)?;
        let (columns, rows) = (base.columns(), base.rows());

        let mut grids = Vec::with_capacity(plan.layers.len());
        for layer in &plan.layers {
            let zoom = layer.zoom_for(plan.zoom)?;
            let grid = build_grid(&plan.bbox, zoom).map_err(ConfigurationError::from)?;
            grids.push(grid);
        }

        info!(
            zoom = plan.zoom,
            columns,
            rows,
            width = base.width(),
            height = base.height(),
            layers = plan.layers.len(),
            "Rendering map"
        );

        let results: Vec<TileResults> = join_all(
            plan.layers
                .iter()
                .zip(&grids)
                .map(|(layer, grid)| self.fetcher.fetch(grid, layer.adapter())),
        )
        .await;

        let layer_diagnostics: Vec<LayerDiagnostics> = plan
            .layers
            .iter()
            .zip(grids.iter().zip(&results))
            .enumerate()
            .map(|(index, (layer, (grid, tiles)))| {
                let diag = LayerDiagnostics::new(index, layer.adapter().id(), grid.zoom(), grid.len(), tiles);
                info!(
                    layer = index,
                    provider = %diag.provider,
                    zoom = diag.zoom,
                    succeeded = diag.succeeded,
                    failed = diag.failed(),
                    "Layer fetched"
                );
                if diag.all_failed() {
                    warn!(layer = index, provider = %diag.provider, "Every tile of layer failed");
                }
                diag
            })
            .collect();

        if layer_diagnostics.iter().all(LayerDiagnostics::all_failed) {
            let first = &layer_diagnostics[0];
            return Err(RenderError::LayerFailed {
                layer: first.index,
                provider: first.provider.clone(),
                failed: first.failed(),
            });
        }

        let layers = plan.layers.clone();
        let size = plan.size;
        let overlay = plan.overlay.clone();
        let options = self.options;
        let markers = self.prefetch_markers(&overlay).await;

        let (canvas, drawn_skips) = tokio::task::spawn_blocking(move || {
            let rasters: Vec<LayerRaster<'_>> = layers
                .iter()
                .zip(grids.iter().zip(&results))
                .map(|(layer, (grid, tiles))| LayerRaster { layer, grid, tiles })
                .collect();

            let canvas = composite(&base, &rasters, &options)?;
            let fitted = fit_to_size(canvas, size)?;

            let projector = Projector::scaled(&base, fitted.scale_x, fitted.scale_y);
            let mut renderer = OverlayRenderer::new(markers.as_ref());
            Ok::<_, RenderError>(renderer.draw(fitted.image, &overlay, &projector))
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;

        let mut skipped_features = plan.overlay.skipped.clone();
        skipped_features.extend(drawn_skips);
        skipped_features.sort_by_key(|s| s.index);

        let diagnostics = RenderDiagnostics {
            grid_columns: columns,
            grid_rows: rows,
            width: canvas.width(),
            height: canvas.height(),
            layers: layer_diagnostics,
            skipped_features,
        };

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            summary = %diagnostics.summary(),
            "Render complete"
        );

        Ok(RenderOutput {
            canvas,
            diagnostics,
        })
    }

    /// Downloads every distinct remote marker the overlay references.
    ///
    /// Failed downloads are kept so the affected points are skipped with the
    /// download error. Local references still go to the configured resolver.
    async fn prefetch_markers(&self, overlay: &FeatureCollection) -> Arc<dyn MarkerResolver> {
        let remote: BTreeSet<&str> = overlay
            .features
            .iter()
            .filter_map(|(_, feature)| match feature {
                GeoFeature::Point { style, .. } => style.image.as_deref(),
                _ => None,
            })
            .filter(|reference| is_remote(reference))
            .collect();

        if remote.is_empty() {
            return Arc::clone(&self.markers);
        }

        let downloads = join_all(remote.iter().map(|url| self.download_marker(url))).await;

        let mut markers = PrefetchedMarkers::new(Arc::clone(&self.markers));
        for (url, download) in remote.into_iter().zip(downloads) {
            match &download {
                Ok(bytes) => debug!(url, bytes = bytes.len(), "Marker downloaded"),
                Err(error) => warn!(url, error = %error, "Marker download failed"),
            }
            markers.insert(url, download);
        }
        Arc::new(markers)
    }

    async fn download_marker(&self, url: &str) -> Result<Vec<u8>, String> {
        let config = self.fetcher.config();
        let _permit = Arc::clone(&config.limiter)
            .acquire_owned()
            .await
            .map_err(|_| "fetch limiter closed".to_string())?;

        match tokio::time::timeout(config.request_timeout, self.fetcher.client().get(url)).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(ProviderError::Timeout(url.to_string()).to_string()),
        }
    }
}
