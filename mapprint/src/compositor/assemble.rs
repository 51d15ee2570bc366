//! Layer buffer assembly.
//!
//! Fetched tiles are pasted at their grid offsets into a buffer the size of
//! the layer's grid. Positions without a tile keep the placeholder color.

use super::ResamplingError;
use crate::coord::{TileIndex, TILE_SIZE};
use crate::fetch::TileResults;
use crate::grid::TileGrid;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, Rgba, RgbaImage};
use tracing::trace;

/// Assembles the fetched tiles of one layer into a single buffer.
///
/// The buffer covers the whole grid. Failed tiles are left as `placeholder`.
pub fn assemble_layer(
    grid: &TileGrid,
    tiles: &TileResults,
    placeholder: Rgba<u8>,
) -> Result<RgbaImage, ResamplingError> {
    let mut buffer = RgbaImage::from_pixel(grid.width(), grid.height(), placeholder);

    for placed in grid.tiles() {
        let Some(tile) = tiles.get(&placed.index) else {
            trace!(tile = %placed.index, "Placeholder for missing tile");
            continue;
        };

        let rgba = normalize_tile(&placed.index, tile)?;
        imageops::replace(
            &mut buffer,
            &rgba,
            placed.offset.0 as i64,
            placed.offset.1 as i64,
        );
    }

    Ok(buffer)
}

/// Converts a decoded tile into a 256×256 RGBA raster.
///
/// High-DPI tiles are scaled down to the grid's tile size.
fn normalize_tile(index: &TileIndex, tile: &DynamicImage) -> Result<RgbaImage, ResamplingError> {
    let color = tile.color();
    if !is_supported(color) {
        return Err(ResamplingError::UnsupportedPixelFormat {
            tile: *index,
            color: format!("{:?}", color),
        });
    }

    let rgba = tile.to_rgba8();
    if rgba.dimensions() == (TILE_SIZE, TILE_SIZE) {
        return Ok(rgba);
    }

    trace!(
        tile = %index,
        width = rgba.width(),
        height = rgba.height(),
        "Rescaling non-standard tile"
    );
    Ok(imageops::resize(&rgba, TILE_SIZE, TILE_SIZE, FilterType::Triangle))
}

/// Integer color types are accepted; floating-point rasters are not tile encodings.
fn is_supported(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L8
            | ColorType::La8
            | ColorType::Rgb8
            | ColorType::Rgba8
            | ColorType::L16
            | ColorType::La16
            | ColorType::Rgb16
            | ColorType::Rgba16
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{BoundingBox, GeoPoint};
    use crate::fetch::{FailureKind, TileFailure};
    use crate::grid::build_grid;
    use crate::testing::solid_tile;
    use image::{GrayImage, Luma, Rgb32FImage};

    fn grid() -> TileGrid {
        let bbox = BoundingBox::new(
            GeoPoint::new(-40.0, -80.0).unwrap(),
            GeoPoint::new(40.0, 80.0).unwrap(),
        )
        .unwrap();
        build_grid(&bbox, 2).unwrap()
    }

    #[test]
    fn test_tiles_land_at_offsets() {
        let grid = grid();
        let mut results = TileResults::new();
        results.add_success(TileIndex::new(1, 1, 2), solid_tile([255, 0, 0, 255]));
        results.add_success(TileIndex::new(2, 2, 2), solid_tile([0, 0, 255, 255]));

        let buffer = assemble_layer(&grid, &results, Rgba([0, 0, 0, 0])).unwrap();

        assert_eq!(buffer.dimensions(), (512, 512));
        assert_eq!(buffer.get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(buffer.get_pixel(300, 300), &Rgba([0, 0, 255, 255]));
        assert_eq!(buffer.get_pixel(300, 10), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_failed_tile_uses_placeholder() {
        let grid = grid();
        let mut results = TileResults::new();
        results.add_failure(TileFailure {
            index: TileIndex::new(1, 1, 2),
            attempts: 3,
            kind: FailureKind::Exhausted,
            error: "timeout".to_string(),
        });

        let magenta = Rgba([255, 0, 255, 255]);
        let buffer = assemble_layer(&grid, &results, magenta).unwrap();

        assert_eq!(buffer.get_pixel(0, 0), &magenta);
        assert_eq!(buffer.get_pixel(511, 511), &magenta);
    }

    #[test]
    fn test_grayscale_and_hidpi_tiles_are_normalized() {
        let grid = grid();
        let mut results = TileResults::new();
        results.add_success(
            TileIndex::new(1, 1, 2),
            DynamicImage::ImageLuma8(GrayImage::from_pixel(256, 256, Luma([128]))),
        );
        results.add_success(TileIndex::new(2, 1, 2), {
            let img = RgbaImage::from_pixel(512, 512, Rgba([0, 255, 0, 255]));
            DynamicImage::ImageRgba8(img)
        });

        let buffer = assemble_layer(&grid, &results, Rgba([0, 0, 0, 0])).unwrap();

        assert_eq!(buffer.get_pixel(100, 100), &Rgba([128, 128, 128, 255]));
        assert_eq!(buffer.get_pixel(400, 100), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_float_tile_is_rejected() {
        let grid = grid();
        let mut results = TileResults::new();
        results.add_success(
            TileIndex::new(1, 1, 2),
            DynamicImage::ImageRgb32F(Rgb32FImage::new(256, 256)),
        );

        let result = assemble_layer(&grid, &results, Rgba([0, 0, 0, 0]));

        assert!(matches!(
            result,
            Err(ResamplingError::UnsupportedPixelFormat { tile, .. }) if tile == TileIndex::new(1, 1, 2)
        ));
    }
}
