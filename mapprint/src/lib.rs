//! mapprint - Static map rendering from web map tiles
//!
//! Renders a geographic bounding box into a single raster image by
//! fetching slippy-map tiles from one or more providers, stacking the
//! layers with per-layer opacity, optionally fitting the result to a
//! target size, and drawing GeoJSON features on top.
//!
//! # High-Level API
//!
//! ```ignore
//! use mapprint::definition::MapDefinition;
//! use mapprint::provider::AsyncReqwestClient;
//! use mapprint::render::MapRenderer;
//! use std::sync::Arc;
//!
//! let definition = MapDefinition::from_path("map.json")?;
//! let renderer = MapRenderer::new(Arc::new(AsyncReqwestClient::new()?));
//! let output = renderer.render(&definition).await?;
//! output.save_png("map.png")?;
//! ```
//!
//! The lower-level modules can be used on their own: [`coord`] for tile
//! math, [`grid`] for covering a bounding box, [`fetch`] for concurrent
//! retrying downloads, [`compositor`] and [`overlay`] for the raster work.

pub mod compositor;
pub mod config;
pub mod coord;
pub mod definition;
pub mod fetch;
pub mod grid;
pub mod logging;
pub mod overlay;
pub mod provider;
pub mod render;

#[cfg(test)]
mod testing;

/// Version of the mapprint library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
