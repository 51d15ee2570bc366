//! Vector overlay: projection and drawing of point, line and polygon features.
//!
//! Features are parsed once from a GeoJSON-style payload into a
//! [`FeatureCollection`], projected through the canvas's [`TileGrid`]
//! (see [`Projector`]) and drawn in declaration order by
//! [`OverlayRenderer`]. Problems with individual features never abort the
//! overlay; they are returned as [`SkippedFeature`] records.
//!
//! [`TileGrid`]: crate::grid::TileGrid

mod draw;
mod error;
mod feature;
mod marker;
mod style;

pub use draw::{OverlayRenderer, Projector};
pub use error::{GeometryError, SkippedFeature};
pub use feature::{CoordinateOrder, FeatureCollection, GeoFeature};
pub use marker::{
    is_remote, FileMarkerResolver, MarkerResolver, MemoryMarkerResolver, PrefetchedMarkers,
};
pub use style::{FillRule, LineCap, LineJoin, Rgba8, Style};
