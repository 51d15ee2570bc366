//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! Web Mercator tile indices and pixel positions. "World pixels" are pixel
//! coordinates over the whole map at a given zoom, with (0, 0) at the
//! northwest corner of tile 0/0/0 and `256 * 2^zoom` pixels per axis.
//!
//! Every function here is pure and safe to call from any thread.

mod types;

pub use types::{
    BoundingBox, CoordError, GeoPoint, TileIndex, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Returns the width (and height) of the world in pixels at `zoom`.
#[inline]
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE as f64 * 2.0_f64.powi(zoom as i32)
}

/// Projects a geographic point to world pixel coordinates.
///
/// Latitude is clamped to the Mercator limit (±85.05112878°) so the poles
/// map to the top and bottom edge instead of infinity.
#[inline]
pub fn world_pixel(point: GeoPoint, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);

    // Longitude maps linearly to x
    let x = (point.longitude + 180.0) / 360.0 * size;

    // Latitude through the Mercator projection: ln(tan(lat) + sec(lat)) == asinh(tan(lat))
    let lat_rad = point.mercator_latitude().to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * size;

    (x, y)
}

/// Inverse of [`world_pixel`].
#[inline]
pub fn geo_point_at_world_pixel(x: f64, y: f64, zoom: u8) -> GeoPoint {
    let size = world_size(zoom);

    let longitude = x / size * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y / size)).sinh().atan();

    GeoPoint {
        latitude: lat_rad * 180.0 / PI,
        longitude,
    }
}

/// Converts a geographic point to the index of the tile containing it.
///
/// # Errors
///
/// Returns [`CoordError::InvalidZoom`] if `zoom` exceeds [`MAX_ZOOM`].
#[inline]
pub fn tile_index_for(point: GeoPoint, zoom: u8) -> Result<TileIndex, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let (x, y) = world_pixel(point, zoom);
    let last = (1u32 << zoom) - 1;

    Ok(TileIndex {
        x: tile_component(x, last),
        y: tile_component(y, last),
        zoom,
    })
}

/// Returns the pixel offset of `point` inside the tile that contains it.
///
/// Both components are in `[0, 256]`; the upper bound is only reached on the
/// east and south edges of the world.
pub fn pixel_offset_within_tile(point: GeoPoint, zoom: u8) -> Result<(f64, f64), CoordError> {
    let tile = tile_index_for(point, zoom)?;
    let (x, y) = world_pixel(point, zoom);
    let tile_size = TILE_SIZE as f64;

    Ok((x - tile.x as f64 * tile_size, y - tile.y as f64 * tile_size))
}

/// Converts a tile index plus a pixel offset inside that tile back to a
/// geographic point.
#[inline]
pub fn geo_point_for(tile: &TileIndex, offset: (f64, f64)) -> GeoPoint {
    let tile_size = TILE_SIZE as f64;
    geo_point_at_world_pixel(
        tile.x as f64 * tile_size + offset.0,
        tile.y as f64 * tile_size + offset.1,
        tile.zoom,
    )
}

/// Returns the geographic position of a tile's northwest corner.
#[inline]
pub fn tile_origin(tile: &TileIndex) -> GeoPoint {
    geo_point_for(tile, (0.0, 0.0))
}

/// Converts tile coordinates to a Bing-style quadkey.
///
/// Interleaves the bits of x and y, most significant zoom level first, into a
/// base-4 string with one digit per zoom level.
pub fn tile_to_quadkey(tile: &TileIndex) -> String {
    let mut quadkey = String::with_capacity(tile.zoom as usize);

    for level in (1..=tile.zoom).rev() {
        let mask = 1u32 << (level - 1);
        let mut digit = b'0';
        if tile.x & mask != 0 {
            digit += 1;
        }
        if tile.y & mask != 0 {
            digit += 2;
        }
        quadkey.push(digit as char);
    }

    quadkey
}

/// Parses a quadkey back into tile coordinates.
pub fn quadkey_to_tile(quadkey: &str) -> Result<TileIndex, CoordError> {
    if quadkey.len() > MAX_ZOOM as usize {
        return Err(CoordError::InvalidQuadkey(quadkey.to_string()));
    }

    let mut x = 0u32;
    let mut y = 0u32;
    for ch in quadkey.chars() {
        x <<= 1;
        y <<= 1;
        match ch {
            '0' => {}
            '1' => x |= 1,
            '2' => y |= 1,
            '3' => {
                x |= 1;
                y |= 1;
            }
            _ => return Err(CoordError::InvalidQuadkey(quadkey.to_string())),
        }
    }

    Ok(TileIndex {
        x,
        y,
        zoom: quadkey.len() as u8,
    })
}

/// Floors a world pixel component to a tile component within `[0, last]`.
#[inline]
fn tile_component(pixel: f64, last: u32) -> u32 {
    let tile = (pixel / TILE_SIZE as f64).floor();
    if tile <= 0.0 {
        0
    } else {
        (tile as u32).min(last)
    }
}
