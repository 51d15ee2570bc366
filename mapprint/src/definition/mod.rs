//! Map definition documents.
//!
//! A [`MapDefinition`] is the JSON input describing one map: its bounding
//! box, zoom, layer stack, optional output size and vector overlay.
//! [`MapDefinition::validate`] checks everything that can be checked without
//! the network and produces a [`MapPlan`].
//!
//! ```
//! use mapprint::definition::MapDefinition;
//!
//! let def = MapDefinition::from_json_str(r#"{
//!     "sw": { "lat": -35.026862, "lng": -58.425003 },
//!     "ne": { "lat": -29.980172, "lng": -52.959305 },
//!     "zoom": 9,
//!     "layers": [{ "type": "osm", "urls": ["https://tile.openstreetmap.org/${z}/${x}/${y}.png"] }]
//! }"#).unwrap();
//!
//! let plan = def.validate().unwrap();
//! assert_eq!(plan.zoom, 9);
//! assert_eq!(plan.layers.len(), 1);
//! ```

use crate::compositor::{Layer, OutputSize};
use crate::coord::{BoundingBox, GeoPoint, MAX_ZOOM};
use crate::overlay::{CoordinateOrder, FeatureCollection};
use crate::provider::ProviderAdapter;
use crate::render::ConfigurationError;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// A corner of the map's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointDefinition {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "lon", alias = "longitude")]
    pub lng: f64,
}

/// One entry of the layer stack.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerDefinition {
    /// Provider id (`osm`, `xyz`, `bing`, `quadkey`)
    #[serde(rename = "type")]
    pub provider: String,
    /// URL templates; the provider default is used when empty
    #[serde(default)]
    pub urls: Vec<String>,
    /// Zoom delta from the map zoom
    #[serde(default)]
    pub level: i32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_opacity() -> f32 {
    1.0
}

/// A map to render, as read from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapDefinition {
    pub sw: PointDefinition,
    pub ne: PointDefinition,
    pub zoom: i64,
    #[serde(default)]
    pub size: Option<OutputSize>,
    #[serde(default)]
    pub layers: Vec<LayerDefinition>,
    /// Feature collection, embedded or as a JSON string
    #[serde(default)]
    pub geojson: Option<Value>,
    #[serde(default)]
    pub coordinate_order: CoordinateOrder,
}

/// A validated map definition.
#[derive(Debug, Clone)]
pub struct MapPlan {
    pub bbox: BoundingBox,
    pub zoom: u8,
    /// Bottom to top
    pub layers: Vec<Layer>,
    pub size: OutputSize,
    pub overlay: FeatureCollection,
}

impl MapDefinition {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks the definition and resolves providers, zooms and the overlay.
    pub fn validate(&self) -> Result<MapPlan, ConfigurationError> {
        let bbox = BoundingBox::new(
            GeoPoint::new(self.sw.lat, self.sw.lng)?,
            GeoPoint::new(self.ne.lat, self.ne.lng)?,
        )?;

        if !(0..=MAX_ZOOM as i64).contains(&self.zoom) {
            return Err(ConfigurationError::InvalidZoom(self.zoom));
        }
        let zoom = self.zoom as u8;

        if self.layers.is_empty() {
            return Err(ConfigurationError::NoLayers);
        }

        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, def)| build_layer(index, def, zoom))
            .collect::<Result<Vec<_>, _>>()?;

        let size = self.size.unwrap_or_default();
        if size.width == Some(0) || size.height == Some(0) {
            return Err(ConfigurationError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }

        let overlay = match &self.geojson {
            Some(payload) => FeatureCollection::parse(payload, self.coordinate_order)
                .map_err(ConfigurationError::Overlay)?,
            None => FeatureCollection::default(),
        };

        Ok(MapPlan {
            bbox,
            zoom,
            layers,
            size,
            overlay,
        })
    }
}

fn build_layer(index: usize, def: &LayerDefinition, zoom: u8) -> Result<Layer, ConfigurationError> {
    let adapter = ProviderAdapter::new(&def.provider, &def.urls)
        .map_err(|source| ConfigurationError::Provider { layer: index, source })?;

    let level = i8::try_from(def.level).map_err(|_| ConfigurationError::InvalidLayerZoom {
        base: zoom,
        level: def.level.clamp(i8::MIN as i32, i8::MAX as i32) as i8,
    })?;

    let layer = Layer::new(adapter, level, def.opacity)?;
    layer.zoom_for(zoom)?;
    Ok(layer)
}
