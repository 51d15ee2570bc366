//! Resampling of layer buffers onto the base canvas pixel grid.
//!
//! A layer fetched at a different zoom than the map covers the same area at
//! a different pixel density. Each base canvas pixel center is mapped into
//! the layer's world pixel space and sampled there; samples that fall outside
//! the layer buffer are transparent.

use super::{ResampleFilter, ResamplingError, TRANSPARENT};
use crate::grid::TileGrid;
use image::{Rgba, RgbaImage};

/// Resamples `buffer`, assembled on `layer`'s grid, onto `base`'s canvas.
///
/// Returns the buffer unchanged when both grids share zoom and extent.
pub fn resample_to_grid(
    base: &TileGrid,
    layer: &TileGrid,
    buffer: RgbaImage,
    filter: ResampleFilter,
) -> Result<RgbaImage, ResamplingError> {
    let (width, height) = (base.width(), base.height());
    if width == 0 || height == 0 {
        return Err(ResamplingError::EmptyTarget { width, height });
    }

    if base.zoom() == layer.zoom()
        && base.origin_tile() == layer.origin_tile()
        && buffer.dimensions() == (width, height)
    {
        return Ok(buffer);
    }

    let scale = 2f64.powi(layer.zoom() as i32 - base.zoom() as i32);
    let (base_x, base_y) = base.origin_world_pixel();
    let (layer_x, layer_y) = layer.origin_world_pixel();

    let mut out = RgbaImage::new(width, height);
    for (px, py, pixel) in out.enumerate_pixels_mut() {
        let lx = (base_x + px as f64 + 0.5) * scale - layer_x - 0.5;
        let ly = (base_y + py as f64 + 0.5) * scale - layer_y - 0.5;
        *pixel = match filter {
            ResampleFilter::Bilinear => sample_bilinear(&buffer, lx, ly),
            ResampleFilter::Nearest => sample_nearest(&buffer, lx, ly),
        };
    }

    Ok(out)
}

fn outside(src: &RgbaImage, x: f64, y: f64) -> bool {
    let (w, h) = src.dimensions();
    w == 0 || h == 0 || x < -0.5 || y < -0.5 || x > w as f64 - 0.5 || y > h as f64 - 0.5
}

fn sample_nearest(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    if outside(src, x, y) {
        return TRANSPARENT;
    }
    let (w, h) = src.dimensions();
    let sx = (x.round().max(0.0) as u32).min(w - 1);
    let sy = (y.round().max(0.0) as u32).min(h - 1);
    *src.get_pixel(sx, sy)
}

/// Bilinear sample, interpolated on premultiplied color.
fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    if outside(src, x, y) {
        return TRANSPARENT;
    }
    let (w, h) = src.dimensions();
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ];

    let mut alpha = 0.0;
    let mut color = [0.0f64; 3];
    for (sx, sy, weight) in taps {
        let p = src.get_pixel(sx, sy).0;
        let a = p[3] as f64 / 255.0 * weight;
        alpha += a;
        for c in 0..3 {
            color[c] += p[c] as f64 * a;
        }
    }

    if alpha <= f64::EPSILON {
        return TRANSPARENT;
    }

    Rgba([
        (color[0] / alpha).round().clamp(0.0, 255.0) as u8,
        (color[1] / alpha).round().clamp(0.0, 255.0) as u8,
        (color[2] / alpha).round().clamp(0.0, 255.0) as u8,
        (alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
