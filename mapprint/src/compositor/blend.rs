//! "Over" compositing of straight-alpha RGBA buffers.

use image::{Rgba, RgbaImage};

/// Blends `layer` over `canvas` in place.
///
/// `opacity` multiplies every layer pixel's alpha. Both buffers must share
/// dimensions; pixels beyond the smaller of the two are left untouched.
pub fn blend_over(canvas: &mut RgbaImage, layer: &RgbaImage, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    let opacity = opacity.min(1.0);

    for (dst, src) in canvas.pixels_mut().zip(layer.pixels()) {
        *dst = over(*dst, *src, opacity);
    }
}

fn over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0 * opacity;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src.0[c] as f32 * sa + dst.0[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}
