//! Multi-layer raster compositing.
//!
//! Each layer is assembled into its own buffer on its own grid, resampled to
//! the base grid's pixel space, then blended onto the canvas with the "over"
//! operator in declaration order (bottom to top). Layer opacity is applied
//! uniformly once the layer buffer is complete, so tile seams blend the same
//! as tile interiors.
//!
//! # Example
//!
//! ```ignore
//! let layers = vec![LayerRaster { layer: &base, grid: &grid, tiles: &tiles }];
//! let canvas = composite(&grid, &layers, &CompositeOptions::default())?;
//! ```

mod assemble;
mod blend;
mod layer;
mod resample;
mod resize;

pub use assemble::assemble_layer;
pub use blend::blend_over;
pub use layer::Layer;
pub use resample::resample_to_grid;
pub use resize::{fit_to_size, Fitted, OutputSize};

use crate::coord::TileIndex;
use crate::fetch::TileResults;
use crate::grid::TileGrid;
use image::{Rgba, RgbaImage};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Fully transparent pixel, the default placeholder.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Filter used when a layer's zoom differs from the base zoom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResampleFilter {
    #[default]
    Bilinear,
    Nearest,
}

impl ResampleFilter {
    /// Parses a filter name (`bilinear` or `nearest`, case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bilinear" | "linear" => Some(Self::Bilinear),
            "nearest" => Some(Self::Nearest),
            _ => None,
        }
    }
}

/// Settings for compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Fill for tile positions whose fetch failed
    pub placeholder: Rgba<u8>,
    pub filter: ResampleFilter,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            placeholder: TRANSPARENT,
            filter: ResampleFilter::default(),
        }
    }
}

impl CompositeOptions {
    pub fn with_placeholder(mut self, placeholder: Rgba<u8>) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Errors raised while turning fetched tiles into canvas pixels.
///
/// These indicate corrupt or unsupported data and abort the render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResamplingError {
    #[error("tile {tile} has unsupported pixel format {color}")]
    UnsupportedPixelFormat { tile: TileIndex, color: String },

    #[error("cannot resample to an empty {width}x{height} target")]
    EmptyTarget { width: u32, height: u32 },
}

/// A layer's fetched tiles, ready to be composited.
#[derive(Debug, Clone, Copy)]
pub struct LayerRaster<'a> {
    pub layer: &'a Layer,
    /// Grid the tiles were fetched on, at the layer's own zoom
    pub grid: &'a TileGrid,
    pub tiles: &'a TileResults,
}

/// Composites `layers` bottom to top onto a canvas covering `base`.
pub fn composite(
    base: &TileGrid,
    layers: &[LayerRaster<'_>],
    options: &CompositeOptions,
) -> Result<RgbaImage, ResamplingError> {
    let started = Instant::now();
    let mut canvas = RgbaImage::from_pixel(base.width(), base.height(), TRANSPARENT);

    for (position, raster) in layers.iter().enumerate() {
        let buffer = assemble_layer(raster.grid, raster.tiles, options.placeholder)?;
        let buffer = resample_to_grid(base, raster.grid, buffer, options.filter)?;
        blend_over(&mut canvas, &buffer, raster.layer.opacity());

        debug!(
            layer = position,
            provider = raster.layer.adapter().id(),
            zoom = raster.grid.zoom(),
            opacity = raster.layer.opacity(),
            "Layer composited"
        );
    }

    debug!(
        width = canvas.width(),
        height = canvas.height(),
        layers = layers.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Compositing complete"
    );

    Ok(canvas)
}
