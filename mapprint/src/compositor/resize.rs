//! Final output size constraint.

use super::ResamplingError;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::Deserialize;
use tracing::debug;

/// Optional maximum output dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct OutputSize {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl OutputSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    /// Target dimensions for a canvas of `width`×`height`.
    ///
    /// Never upscales. A single constraint keeps the aspect ratio; two
    /// constraints clamp each axis independently.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (None, None) => (width, height),
            (Some(max_w), Some(max_h)) => (width.min(max_w), height.min(max_h)),
            (Some(max_w), None) if max_w < width => {
                let scale = max_w as f64 / width as f64;
                (max_w, ((height as f64 * scale).round() as u32).max(1))
            }
            (None, Some(max_h)) if max_h < height => {
                let scale = max_h as f64 / height as f64;
                (((width as f64 * scale).round() as u32).max(1), max_h)
            }
            _ => (width, height),
        }
    }
}

/// A canvas fitted to an [`OutputSize`], with the scale factors applied.
#[derive(Debug, Clone)]
pub struct Fitted {
    pub image: RgbaImage,
    pub scale_x: f64,
    pub scale_y: f64,
}

/// Downscales `canvas` into `size` with a single Lanczos3 pass.
pub fn fit_to_size(canvas: RgbaImage, size: OutputSize) -> Result<Fitted, ResamplingError> {
    let (width, height) = canvas.dimensions();
    let (target_w, target_h) = size.fit(width, height);

    if target_w == 0 || target_h == 0 {
        return Err(ResamplingError::EmptyTarget {
            width: target_w,
            height: target_h,
        });
    }

    if (target_w, target_h) == (width, height) {
        return Ok(Fitted {
            image: canvas,
            scale_x: 1.0,
            scale_y: 1.0,
        });
    }

    debug!(
        from_width = width,
        from_height = height,
        width = target_w,
        height = target_h,
        "Downscaling canvas"
    );

    let image = imageops::resize(&canvas, target_w, target_h, FilterType::Lanczos3);
    Ok(Fitted {
        image,
        scale_x: target_w as f64 / width as f64,
        scale_y: target_h as f64 / height as f64,
    })
}
