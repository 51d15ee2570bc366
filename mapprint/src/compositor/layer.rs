//! Map layer declaration.

use crate::coord::MAX_ZOOM;
use crate::provider::ProviderAdapter;
use crate::render::ConfigurationError;

/// One raster layer of a map, stacked in declaration order.
///
/// Immutable once built; all validation happens in [`Layer::new`].
#[derive(Debug, Clone)]
pub struct Layer {
    adapter: ProviderAdapter,
    level: i8,
    opacity: f32,
}

impl Layer {
    /// Creates a layer.
    ///
    /// # Arguments
    ///
    /// * `adapter` - Addressing for the layer's provider
    /// * `level` - Zoom delta applied to the map's base zoom for this layer
    /// * `opacity` - Uniform alpha multiplier in `[0, 1]`
    pub fn new(adapter: ProviderAdapter, level: i8, opacity: f32) -> Result<Self, ConfigurationError> {
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigurationError::InvalidOpacity(opacity));
        }
        Ok(Self {
            adapter,
            level,
            opacity,
        })
    }

    pub fn adapter(&self) -> &ProviderAdapter {
        &self.adapter
    }

    pub fn level(&self) -> i8 {
        self.level
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Zoom level this layer's tiles are fetched at for a map at `base_zoom`.
    pub fn zoom_for(&self, base_zoom: u8) -> Result<u8, ConfigurationError> {
        let zoom = base_zoom as i16 + self.level as i16;
        if !(0..=MAX_ZOOM as i16).contains(&zoom) {
            return Err(ConfigurationError::InvalidLayerZoom {
                base: base_zoom,
                level: self.level,
            });
        }
        Ok(zoom as u8)
    }
}
