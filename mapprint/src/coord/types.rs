//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the slippy-tile providers we talk to
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Edge length of a provider tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees, -90 to 90
    pub latitude: f64,
    /// Longitude in degrees, -180 to 180
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting coordinates outside the WGS84 range.
    ///
    /// Latitudes beyond the Web Mercator limit are accepted here; the
    /// projection clamps them when converting to pixel space.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude clamped into the range the Mercator projection can represent.
    #[inline]
    pub fn mercator_latitude(&self) -> f64 {
        self.latitude.clamp(MIN_LAT, MAX_LAT)
    }
}

/// Geographic rectangle described by its southwest and northeast corners.
///
/// When `southwest.longitude > northeast.longitude` the box crosses the
/// antimeridian and spans eastwards from the southwest corner through 180°.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub southwest: GeoPoint,
    pub northeast: GeoPoint,
}

impl BoundingBox {
    /// Creates a bounding box, requiring the southwest corner to lie south of
    /// the northeast corner.
    pub fn new(southwest: GeoPoint, northeast: GeoPoint) -> Result<Self, CoordError> {
        if southwest.latitude >= northeast.latitude {
            return Err(CoordError::InvalidBoundingBox {
                south: southwest.latitude,
                north: northeast.latitude,
            });
        }
        Ok(Self {
            southwest,
            northeast,
        })
    }

    /// Returns true if the box wraps around the 180° meridian.
    #[inline]
    pub fn crosses_antimeridian(&self) -> bool {
        self.southwest.longitude > self.northeast.longitude
    }

    /// Northwest corner of the box.
    pub fn northwest(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.northeast.latitude,
            longitude: self.southwest.longitude,
        }
    }

    /// Southeast corner of the box.
    pub fn southeast(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.southwest.latitude,
            longitude: self.northeast.longitude,
        }
    }
}

/// Tile coordinates in the Web Mercator / slippy map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    /// X coordinate (west-east), 0 at 180°W
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level (0-19)
    pub zoom: u8,
}

impl TileIndex {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Number of tiles along one axis at this tile's zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.zoom
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-90.0 to 90.0)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 19)
    InvalidZoom(u8),
    /// Southwest corner is not south of the northeast corner
    InvalidBoundingBox { south: f64, north: f64 },
    /// Quadkey contains invalid characters or is too long
    InvalidQuadkey(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(f, "Invalid latitude: {} (must be between -90 and 90)", lat)
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidBoundingBox { south, north } => {
                write!(
                    f,
                    "Invalid bounding box: southwest latitude {} must be below northeast latitude {}",
                    south, north
                )
            }
            CoordError::InvalidQuadkey(quadkey) => {
                write!(
                    f,
                    "Invalid quadkey: '{}' (must contain only digits 0-3 and length <= {})",
                    quadkey, MAX_ZOOM
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
