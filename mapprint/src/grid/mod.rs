//! Tile grid construction.
//!
//! A [`TileGrid`] is the minimal rectangle of tiles covering a bounding box
//! at one zoom level, together with where each tile lands on the output
//! canvas. The canvas origin is the northwest corner of the grid's first
//! tile, so the canvas always covers whole tiles.
//!
//! Grids that cross the antimeridian keep their columns contiguous on the
//! canvas: the columns run from the southwest tile to the eastern edge of the
//! world, then continue from column 0.

use crate::coord::{
    geo_point_at_world_pixel, world_pixel, world_size, BoundingBox, CoordError, GeoPoint,
    TileIndex, MAX_ZOOM, TILE_SIZE,
};

/// Tolerance, in tiles, for corners that sit on a tile boundary.
const EDGE_EPSILON: f64 = 1e-6;

/// A tile together with its top-left pixel position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedTile {
    pub index: TileIndex,
    /// Top-left corner of the tile on the canvas, in pixels
    pub offset: (u32, u32),
}

/// An ordered rectangular set of tiles covering a bounding box.
///
/// Tiles are stored row-major, north to south and west to east.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    zoom: u8,
    /// First column (unwrapped) and first row of the grid
    origin: (u32, u32),
    columns: u32,
    rows: u32,
    tiles: Vec<PlacedTile>,
}

impl TileGrid {
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.columns * TILE_SIZE
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.rows * TILE_SIZE
    }

    pub fn tiles(&self) -> &[PlacedTile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Index of the northwest tile.
    pub fn origin_tile(&self) -> TileIndex {
        TileIndex::new(self.origin.0, self.origin.1, self.zoom)
    }

    /// World pixel position of the canvas origin.
    pub fn origin_world_pixel(&self) -> (f64, f64) {
        (
            self.origin.0 as f64 * TILE_SIZE as f64,
            self.origin.1 as f64 * TILE_SIZE as f64,
        )
    }

    /// Returns true if the grid's columns wrap past the eastern edge of the world.
    pub fn wraps_antimeridian(&self) -> bool {
        self.origin.0 + self.columns > (1u32 << self.zoom)
    }

    /// Projects a geographic point onto this grid's canvas.
    ///
    /// The result is fractional and may fall outside the canvas for points
    /// outside the grid.
    pub fn project(&self, point: GeoPoint) -> (f64, f64) {
        let (x, y) = world_pixel(point, self.zoom);
        let (ox, oy) = self.origin_world_pixel();

        let dx = x - ox;
        if !self.wraps_antimeridian() {
            return (dx, y - oy);
        }

        // Pick the copy of the point nearest to the canvas span
        let world = world_size(self.zoom);
        let width = self.width() as f64;
        let distance = |x: f64| (-x).max(x - width).max(0.0);
        let dx = [dx + world, dx - world]
            .into_iter()
            .fold(dx, |best, candidate| {
                if distance(candidate) < distance(best) {
                    candidate
                } else {
                    best
                }
            });

        (dx, y - oy)
    }

    /// Converts a canvas pixel position back to a geographic point.
    pub fn geo_point_at(&self, px: f64, py: f64) -> GeoPoint {
        let (ox, oy) = self.origin_world_pixel();
        let world = world_size(self.zoom);
        let x = (ox + px).rem_euclid(world);
        geo_point_at_world_pixel(x, oy + py, self.zoom)
    }
}

/// Builds the tile grid covering `bbox` at `zoom`.
///
/// The west and north edges are inclusive, the east and south edges
/// exclusive: a corner sitting exactly on a tile boundary does not pull in
/// the neighbouring tile.
pub fn build_grid(bbox: &BoundingBox, zoom: u8) -> Result<TileGrid, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let per_axis = 1u32 << zoom;
    let last = per_axis - 1;

    let (west, north) = world_pixel(bbox.northwest(), zoom);
    let (mut east, south) = world_pixel(bbox.southeast(), zoom);

    // An east edge on -180 is the eastern edge of the world, not column 0
    let mut crosses = bbox.crosses_antimeridian();
    if crosses && east <= 0.0 {
        east = world_size(zoom);
        crosses = false;
    }

    let min_x = first_tile(west, last);
    let max_x = last_tile(east, last);
    let min_y = first_tile(north, last);
    let max_y = last_tile(south, last).max(min_y);

    let columns = if crosses {
        ((per_axis - min_x) + (max_x + 1)).min(per_axis)
    } else {
        max_x.max(min_x) - min_x + 1
    };
    let rows = max_y - min_y + 1;

    let mut tiles = Vec::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        for col in 0..columns {
            tiles.push(PlacedTile {
                index: TileIndex::new((min_x + col) % per_axis, min_y + row, zoom),
                offset: (col * TILE_SIZE, row * TILE_SIZE),
            });
        }
    }

    Ok(TileGrid {
        zoom,
        origin: (min_x, min_y),
        columns,
        rows,
        tiles,
    })
}

/// Tile containing the inclusive (west/north) edge at `pixel`.
fn first_tile(pixel: f64, last: u32) -> u32 {
    let tile = (pixel / TILE_SIZE as f64 + EDGE_EPSILON).floor();
    clamp_tile(tile, last)
}

/// Tile containing the exclusive (east/south) edge at `pixel`.
fn last_tile(pixel: f64, last: u32) -> u32 {
    let tile = (pixel / TILE_SIZE as f64 - EDGE_EPSILON).ceil() - 1.0;
    clamp_tile(tile, last)
}

fn clamp_tile(tile: f64, last: u32) -> u32 {
    if tile <= 0.0 {
        0
    } else {
        (tile as u32).min(last)
    }
}
